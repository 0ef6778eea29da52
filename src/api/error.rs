//! HTTP status mapping for [`Error`].
//!
//! Failure bodies keep the `{success: false, error}` shape; store and internal
//! failures are logged in full and reported with a generic message.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

impl Error {
    /// Status code returned to HTTP clients for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ProductNotFound { .. }
            | Self::CategoryNotFound { .. }
            | Self::UserNotFound { .. }
            | Self::OrderNotFound { .. } => StatusCode::NOT_FOUND,

            Self::DuplicateName { .. } | Self::EmailTaken { .. } | Self::ReferencedByOrder { .. } => {
                StatusCode::CONFLICT
            }

            Self::InsufficientStock { .. }
            | Self::EmptyCart
            | Self::Validation { .. }
            | Self::InvalidAmount { .. } => StatusCode::UNPROCESSABLE_ENTITY,

            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,

            Self::Database(_)
            | Self::Config { .. }
            | Self::PasswordHash { .. }
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.status_code().is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        (
            status,
            Json(json!({ "success": false, "error": self.public_message() })),
        )
            .into_response()
    }
}
