//! Shared test utilities for the storefront.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{account, catalog},
    entities::{self, Role},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds product fields with no description, image or category.
pub fn sample_new_product(name: &str, price: &str, stock: i32) -> catalog::NewProduct {
    catalog::NewProduct {
        name: name.to_string(),
        description: None,
        price: price.parse::<Decimal>().unwrap(),
        image: None,
        stock,
        active: None,
        category_id: None,
    }
}

/// Creates an active product with the given price (e.g. `"10.00"`) and stock.
pub async fn create_custom_product(
    db: &DatabaseConnection,
    name: &str,
    price: &str,
    stock: i32,
) -> Result<entities::product::Model> {
    catalog::create_product(db, sample_new_product(name, price, stock)).await
}

/// Creates a customer with a fixed password (`"password"`).
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
) -> Result<entities::user::Model> {
    account::create_user(db, "Test User", email, "password", Role::Customer).await
}
