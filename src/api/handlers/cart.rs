//! Cart endpoints.

use crate::{api::AppState, core::cart, errors::Result};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Body of `POST /cart/add`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    /// Cart owner
    pub user_id: i32,
    /// Product to add
    pub product_id: i32,
    /// Units to add, at least 1
    pub quantity: i32,
}

/// `GET /cart/{user_id}` - the cart and its lines, creating the cart on first use.
pub async fn get_cart(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<Value>> {
    let (cart, items) = cart::get_cart_with_items(&state.db, user_id).await?;
    Ok(Json(json!({ "cart": cart, "items": items })))
}

/// `POST /cart/add`
pub async fn add_item(
    State(state): State<AppState>,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<Value>> {
    let item = cart::add_item(&state.db, body.user_id, body.product_id, body.quantity).await?;
    Ok(Json(json!({ "success": true, "item": item })))
}

/// `DELETE /cart/item/{item_id}`
pub async fn remove_item(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
) -> Result<Json<Value>> {
    cart::remove_item(&state.db, item_id).await?;
    Ok(Json(json!({ "success": true })))
}
