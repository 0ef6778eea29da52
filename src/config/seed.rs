//! Catalog seed loading from a TOML file.
//!
//! The seed file lists categories, users and products. Seeding is idempotent:
//! categories are matched by name, users by email and products by name, and
//! anything already present is skipped.

use crate::{
    core::{account, catalog},
    entities::{Category, Product, Role, category, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use std::{collections::HashMap, path::Path};

/// Structure of the whole seed file
#[derive(Debug, Default, Deserialize)]
pub struct SeedConfig {
    /// Categories to create
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    /// Accounts to create
    #[serde(default)]
    pub users: Vec<UserSeed>,
    /// Products to create
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// One seeded category
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySeed {
    /// Unique category name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
}

/// One seeded account
#[derive(Debug, Clone, Deserialize)]
pub struct UserSeed {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Plain password, hashed on insert
    pub password: String,
    /// Defaults to customer
    #[serde(default = "default_role")]
    pub role: Role,
}

const fn default_role() -> Role {
    Role::Customer
}

/// One seeded product
#[derive(Debug, Clone, Deserialize)]
pub struct ProductSeed {
    /// Product name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Unit price, e.g. `"1499.99"`
    pub price: Decimal,
    /// Initial stock
    pub stock: i32,
    /// Optional image URL
    pub image: Option<String>,
    /// Category, by name
    pub category: Option<String>,
}

/// What a seeding run inserted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    /// New categories
    pub categories: usize,
    /// New users
    pub users: usize,
    /// New products
    pub products: usize,
}

/// Parses a seed file from TOML text.
///
/// # Errors
/// Returns [`Error::Config`] when the TOML is invalid.
pub fn parse_seed(contents: &str) -> Result<SeedConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse seed file: {e}"),
    })
}

/// Loads a seed file from disk.
///
/// # Errors
/// Returns [`Error::Config`] when the file cannot be read or parsed.
pub fn load_seed<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let path = path.as_ref();
    tracing::debug!("Loading seed file from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read seed file {}: {e}", path.display()),
    })?;
    parse_seed(&contents)
}

/// Inserts everything in the seed that does not exist yet.
pub async fn seed_database(db: &DatabaseConnection, seed: &SeedConfig) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    let mut category_ids: HashMap<String, i32> = HashMap::new();

    for entry in &seed.categories {
        let existing = Category::find()
            .filter(category::Column::Name.eq(entry.name.trim()))
            .one(db)
            .await?;
        let id = match existing {
            Some(found) => found.id,
            None => {
                report.categories += 1;
                catalog::create_category(db, entry.name.clone(), entry.description.clone())
                    .await?
                    .id
            }
        };
        category_ids.insert(entry.name.trim().to_string(), id);
    }

    for entry in &seed.users {
        if account::get_user_by_email(db, &entry.email).await?.is_some() {
            tracing::debug!("Seed user {} already exists, skipping", entry.email);
            continue;
        }
        account::create_user(db, &entry.name, &entry.email, &entry.password, entry.role).await?;
        report.users += 1;
    }

    for entry in &seed.products {
        let exists = Product::find()
            .filter(product::Column::Name.eq(entry.name.trim()))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let category_id = match entry.category.as_deref() {
            Some(name) => Some(*category_ids.get(name.trim()).ok_or_else(|| Error::Config {
                message: format!(
                    "Seed product '{}' references unknown category '{name}'",
                    entry.name
                ),
            })?),
            None => None,
        };

        catalog::create_product(
            db,
            catalog::NewProduct {
                name: entry.name.clone(),
                description: entry.description.clone(),
                price: entry.price,
                image: entry.image.clone(),
                stock: entry.stock,
                active: Some(true),
                category_id,
            },
        )
        .await?;
        report.products += 1;
    }

    tracing::info!(
        categories = report.categories,
        users = report.users,
        products = report.products,
        "Seeding finished"
    );
    Ok(report)
}
