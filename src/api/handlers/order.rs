//! Order endpoints.

use crate::{api::AppState, core::order, entities::OrderStatus, errors::Result};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Body of `POST /orders/create`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Buyer whose cart is checked out
    pub user_id: i32,
}

/// Body of `PATCH /orders/{id}/status`
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Target state
    pub status: OrderStatus,
}

/// `POST /orders/create` - checks out the user's cart.
pub async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let details = order::create_order(&state.db, body.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "order": details })),
    ))
}

/// `GET /orders/{id}` - order history for a user, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<Value>> {
    let orders = order::list_orders_for_user(&state.db, user_id).await?;
    Ok(Json(json!({ "orders": orders })))
}

/// `GET /orders/detail/{id}`
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<Json<Value>> {
    let details = order::get_order(&state.db, order_id).await?;
    Ok(Json(json!({ "order": details })))
}

/// `PATCH /orders/{id}/status`
pub async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Value>> {
    let updated = order::update_order_status(&state.db, order_id, body.status).await?;
    Ok(Json(json!({ "success": true, "order": updated })))
}
