//! HTTP layer - axum router, shared state and JSON handlers.
//!
//! Handlers are thin: they parse the request, call into [`crate::core`] and shape
//! the JSON response. Errors convert into responses through [`error`].

/// Status code mapping for errors
pub mod error;
/// Route handlers grouped by resource
pub mod handlers;

use crate::{config::server::ServerConfig, errors::{Error, Result}};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, patch, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared data available to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection for all database operations
    pub db: DatabaseConnection,
    /// Server settings
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Creates a new `AppState` from a connection and settings.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: ServerConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

fn cors_layer(frontend_url: Option<&str>) -> Result<CorsLayer> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let Some(origin) = frontend_url else {
        return Ok(CorsLayer::permissive());
    };
    let origin = origin.parse::<HeaderValue>().map_err(|e| Error::Config {
        message: format!("Invalid FRONTEND_URL '{origin}': {e}"),
    })?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}

/// Builds the full router.
///
/// # Errors
/// Returns [`Error::Config`] when the configured CORS origin is not a valid header value.
pub fn create_router(state: AppState) -> Result<Router> {
    let cors = cors_layer(state.config.frontend_url.as_deref())?;

    let router = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        // Catalog
        .route(
            "/categories",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route(
            "/products",
            get(handlers::catalog::list_products).post(handlers::catalog::create_product),
        )
        .route(
            "/products/{id}",
            get(handlers::catalog::get_product)
                .put(handlers::catalog::update_product)
                .delete(handlers::catalog::delete_product),
        )
        .route(
            "/products/{id}/toggle",
            patch(handlers::catalog::toggle_product),
        )
        // Accounts
        .route("/auth/register", post(handlers::account::register))
        .route("/auth/login", post(handlers::account::login))
        // Cart
        .route("/cart/add", post(handlers::cart::add_item))
        .route("/cart/item/{item_id}", delete(handlers::cart::remove_item))
        .route("/cart/{user_id}", get(handlers::cart::get_cart))
        // Orders
        .route("/orders/create", post(handlers::order::create_order))
        .route("/orders/detail/{id}", get(handlers::order::get_order))
        .route("/orders/{id}/status", patch(handlers::order::update_status))
        .route("/orders/{id}", get(handlers::order::list_orders))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(router)
}
