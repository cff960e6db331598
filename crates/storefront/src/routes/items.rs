//! Catalog endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cartwheel_core::{ItemId, ItemStatus, Price};

use crate::error::{ApiJson, Result};
use crate::middleware::RequireAuth;
use crate::models::Item;
use crate::services::CatalogService;
use crate::state::AppState;

/// One row of the public item listing.
#[derive(Debug, Serialize)]
pub struct ItemListing {
    id: ItemId,
    name: String,
    price: Price,
    status: ItemStatus,
}

impl From<Item> for ItemListing {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price,
            status: item.status,
        }
    }
}

/// Body of `POST /items`. A price of zero or less fails to deserialize.
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub price: Price,
}

/// List the catalog, one entry per item name.
#[instrument(skip_all)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ItemListing>>> {
    let items = CatalogService::new(state.pool()).list().await?;
    Ok(Json(items.into_iter().map(ItemListing::from).collect()))
}

/// Add an item to the catalog.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user_id): RequireAuth,
    ApiJson(request): ApiJson<CreateItemRequest>,
) -> Result<(StatusCode, Json<Item>)> {
    let item = CatalogService::new(state.pool())
        .create(&request.name, request.price)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}
