//! Route handlers - one module per resource.

/// Login and registration
pub mod account;
/// Per-user cart
pub mod cart;
/// Categories and products
pub mod catalog;
/// Checkout and order history
pub mod order;

use axum::Json;
use serde_json::{Value, json};

/// `GET /` - service banner.
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
