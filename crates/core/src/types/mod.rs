//! Core types for Cartwheel.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod identity;
pub mod price;
pub mod status;
pub mod username;

pub use id::*;
pub use identity::{Identity, SessionToken, SessionTokenError};
pub use price::{Price, PriceError};
pub use status::*;
pub use username::{Username, UsernameError};
