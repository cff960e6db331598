//! Cartwheel storefront library.
//!
//! Carts, orders, users and the item catalog behind a JSON API. The binary
//! in `main.rs` wires this up to a listener; tests drive [`routes::app`]
//! directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
