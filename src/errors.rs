//! Unified error type for the storefront.
//!
//! Every core operation returns [`Result`]. The HTTP layer turns each variant
//! into a status code and a `{success: false, error}` body, see
//! [`crate::api::error`].

use rust_decimal::Decimal;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// All failures the storefront can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying store failure
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Missing or malformed configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// Rejected input (empty names, negative prices, zero quantities...)
    #[error("Invalid input: {message}")]
    Validation {
        /// What was wrong
        message: String,
    },

    /// A money amount that cannot be stored
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The offending amount
        amount: Decimal,
    },

    /// Product lookup failed
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// Requested product id
        id: i32,
    },

    /// Category lookup failed
    #[error("Category not found: {id}")]
    CategoryNotFound {
        /// Requested category id
        id: i32,
    },

    /// User lookup failed
    #[error("User not found: {id}")]
    UserNotFound {
        /// Requested user id
        id: i32,
    },

    /// Order lookup failed
    #[error("Order not found: {id}")]
    OrderNotFound {
        /// Requested order id
        id: i32,
    },

    /// Category names are unique
    #[error("Category '{name}' already exists")]
    DuplicateName {
        /// The name that collided
        name: String,
    },

    /// User emails are unique
    #[error("Email '{email}' is already registered")]
    EmailTaken {
        /// The email that collided
        email: String,
    },

    /// Not enough units of a product to satisfy a cart line or an order
    #[error("Insufficient stock for {product}. Available: {available}")]
    InsufficientStock {
        /// Product name
        product: String,
        /// Units available at the time of the check
        available: i32,
    },

    /// Checkout attempted without a cart or with no items in it
    #[error("Cart is empty")]
    EmptyCart,

    /// Product delete blocked because past orders reference it
    #[error("Product {id} cannot be deleted: it is referenced by orders")]
    ReferencedByOrder {
        /// Product id
        id: i32,
    },

    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password hashing backend failure
    #[error("Password hashing error: {message}")]
    PasswordHash {
        /// Backend message
        message: String,
    },

    /// I/O failure (config files, sockets)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether the store rejected a write because of a unique constraint.
    #[must_use]
    pub fn is_unique_violation(err: &DbErr) -> bool {
        matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
    }

    /// Whether the store rejected a write because of a foreign key constraint.
    #[must_use]
    pub fn is_foreign_key_violation(err: &DbErr) -> bool {
        matches!(err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
