//! Cart endpoints.
//!
//! Both endpoints accept either a bearer token or an `X-Session-ID` header.
//! Adding to a cart without either mints a session token, which is returned
//! in the `X-Session-ID` response header. Viewing never mints. A bearer
//! token makes the session header irrelevant, even a malformed one.

use axum::{
    Json,
    extract::State,
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cartwheel_core::{CartId, ItemId};

use crate::error::{ApiJson, AppError, Result, add_breadcrumb};
use crate::middleware::{OptionalAuth, SESSION_HEADER, SessionHeader};
use crate::models::{CartView, CartWithLines, PricedLine};
use crate::services::{CartService, IdentityError, MintPolicy, identity};
use crate::state::AppState;

const fn default_quantity() -> i32 {
    1
}

/// Body of `POST /carts`.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub item_id: ItemId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct AddToCartResponse {
    message: &'static str,
    cart_id: CartId,
    cart: CartWithLines,
}

/// `GET /carts` body. The three shapes are distinguished by their fields.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CartResponse {
    Populated {
        cart_id: CartId,
        items: Vec<PricedLine>,
        total: Decimal,
    },
    Empty {
        message: &'static str,
        cart_id: CartId,
    },
    Missing {
        message: &'static str,
        cart: Option<CartId>,
    },
}

impl From<CartView> for CartResponse {
    fn from(view: CartView) -> Self {
        match view {
            CartView::NoActiveCart => Self::Missing {
                message: "No active cart found",
                cart: None,
            },
            CartView::Empty { cart_id } => Self::Empty {
                message: "Cart is empty",
                cart_id,
            },
            CartView::Populated {
                cart_id,
                lines,
                total,
            } => Self::Populated {
                cart_id,
                items: lines,
                total,
            },
        }
    }
}

/// Add an item to the caller's active cart, creating the cart if needed.
#[instrument(skip_all, fields(item_id = %request.item_id, quantity = request.quantity))]
pub async fn add(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    SessionHeader(session): SessionHeader,
    ApiJson(request): ApiJson<AddToCartRequest>,
) -> Result<Response> {
    let resolved = identity::resolve(user, session.as_deref(), MintPolicy::Mint)?;

    let added = CartService::new(state.pool())
        .add_to_cart(&resolved.identity, request.item_id, request.quantity)
        .await?;

    let cart_id = added.cart.cart.id;
    let (cart_field, item_field) = (cart_id.to_string(), request.item_id.to_string());
    add_breadcrumb(
        "cart",
        "Added item",
        Some(&[("cart_id", cart_field.as_str()), ("item_id", item_field.as_str())]),
    );

    let mut response = Json(AddToCartResponse {
        message: "Item added to cart successfully",
        cart_id,
        cart: added.cart,
    })
    .into_response();

    if let Some(token) = resolved.minted {
        let value = HeaderValue::from_str(token.as_str())
            .map_err(|e| AppError::Internal(format!("unencodable session token: {e}")))?;
        response.headers_mut().insert(SESSION_HEADER, value);
    }

    Ok(response)
}

/// Show the caller's active cart with current prices.
///
/// A caller with no identity has no cart, which is not an error.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    SessionHeader(session): SessionHeader,
) -> Result<Json<CartResponse>> {
    let resolved = match identity::resolve(user, session.as_deref(), MintPolicy::Never) {
        Ok(resolved) => resolved,
        Err(IdentityError::NoIdentity) => return Ok(Json(CartView::NoActiveCart.into())),
        Err(err) => return Err(err.into()),
    };
    let view = CartService::new(state.pool())
        .view(&resolved.identity)
        .await?;
    Ok(Json(view.into()))
}
