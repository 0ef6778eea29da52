//! Account endpoints.

use crate::{
    api::AppState,
    core::account,
    entities::{Role, user},
    errors::Result,
};
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Body of `POST /auth/register`
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Plain password
    pub password: String,
}

/// Body of `POST /auth/login`
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email
    pub email: String,
    /// Plain password
    pub password: String,
}

/// The public face of an account; never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// Account id
    pub id: i32,
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Customer or admin
    pub role: Role,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let user = account::register(&state.db, &body.name, &body.email, &body.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "user": UserResponse::from(user) })),
    ))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let user = account::login(&state.db, &body.email, &body.password).await?;
    Ok(Json(json!({ "success": true, "user": UserResponse::from(user) })))
}
