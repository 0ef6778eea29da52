//! Category and product endpoints.
//!
//! Product writes are admin operations; the storefront never exposes them to
//! customers, so no role check happens here.

use crate::{
    api::AppState,
    core::catalog::{self, NewProduct, ProductChanges, ProductFilter},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of `POST /categories`
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Unique name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
}

/// Query string of `GET /products`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    /// Include inactive products
    pub admin: Option<bool>,
    /// Only this category
    pub category_id: Option<i32>,
    /// Case-insensitive match on name or description
    pub search: Option<String>,
    /// Inclusive lower price bound
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound
    pub max_price: Option<Decimal>,
    /// Subtract this user's cart from the shown stock
    pub user_id: Option<i32>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        Self {
            admin: query.admin.unwrap_or(false),
            category_id: query.category_id,
            search: query.search.filter(|s| !s.trim().is_empty()),
            min_price: query.min_price,
            max_price: query.max_price,
            user_id: query.user_id,
        }
    }
}

/// Body of `POST /products`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Unit price, as a number or a decimal string
    pub price: Decimal,
    /// Optional image URL
    pub image: Option<String>,
    /// Initial stock, defaults to 0
    #[serde(default)]
    pub stock: i32,
    /// Defaults to active
    pub active: Option<bool>,
    /// Optional category
    pub category_id: Option<i32>,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(body: CreateProductRequest) -> Self {
        Self {
            name: body.name,
            description: body.description,
            price: body.price,
            image: body.image,
            stock: body.stock,
            active: body.active,
            category_id: body.category_id,
        }
    }
}

/// Body of `PUT /products/{id}`. Omitted fields stay untouched; `null` clears
/// the nullable ones.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    /// New name
    pub name: Option<String>,
    /// New description, `null` to clear
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    /// New price
    pub price: Option<Decimal>,
    /// New image URL, `null` to clear
    #[serde(default, deserialize_with = "nullable")]
    pub image: Option<Option<String>>,
    /// New stock level
    pub stock: Option<i32>,
    /// New visibility
    pub active: Option<bool>,
    /// New category, `null` to detach
    #[serde(default, deserialize_with = "nullable")]
    pub category_id: Option<Option<i32>>,
}

impl From<UpdateProductRequest> for ProductChanges {
    fn from(body: UpdateProductRequest) -> Self {
        Self {
            name: body.name,
            description: body.description,
            price: body.price,
            image: body.image,
            stock: body.stock,
            active: body.active,
            category_id: body.category_id,
        }
    }
}

/// `GET /categories`
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Value>> {
    let categories = catalog::list_categories(&state.db).await?;
    Ok(Json(json!({ "categories": categories })))
}

/// `POST /categories`
pub async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let category = catalog::create_category(&state.db, body.name, body.description).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "category": category })),
    ))
}

/// `GET /products`. A failing listing still answers with an empty product list.
pub async fn list_products(
    State(state): State<AppState>,
    query: std::result::Result<Query<ProductQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected product listing query");
            return (
                rejection.status(),
                Json(json!({ "products": [], "error": rejection.body_text() })),
            )
                .into_response();
        }
    };
    let filter = ProductFilter::from(query);
    match catalog::list_products(&state.db, &filter).await {
        Ok(products) => Json(json!({ "products": products })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list products");
            (
                e.status_code(),
                Json(json!({ "products": [], "error": e.public_message() })),
            )
                .into_response()
        }
    }
}

/// `GET /products/{id}`
pub async fn get_product(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    match catalog::get_product(&state.db, id).await {
        Ok(product) => Json(json!({ "product": product })).into_response(),
        Err(Error::ProductNotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Product not found" })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// `POST /products`
pub async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let product = catalog::create_product(&state.db, body.into()).await?;
    Ok((StatusCode::CREATED, Json(json!({ "product": product }))))
}

/// `PUT /products/{id}`
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<Value>> {
    let product = catalog::update_product(&state.db, id, body.into()).await?;
    Ok(Json(json!({ "success": true, "product": product })))
}

/// `PATCH /products/{id}/toggle`
pub async fn toggle_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let product = catalog::toggle_active(&state.db, id).await?;
    Ok(Json(json!({ "success": true, "product": product })))
}

/// `DELETE /products/{id}`
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    catalog::delete_product(&state.db, id).await?;
    Ok(Json(json!({ "success": true })))
}
