//! Catalog business logic - categories and products.
//!
//! This module provides functions for creating, listing, updating, toggling and
//! deleting catalog entries. Product listing pushes the active flag, category and
//! inclusive price bounds into the query, applies the case-insensitive search on
//! the loaded rows, and can report stock net of what a given user already holds
//! in their cart.

use crate::{
    core::{cart, money},
    entities::{Category, OrderItem, Product, category, order_item, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;

/// Retrieves all categories ordered alphabetically by name.
pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a category by id.
pub async fn get_category_by_id(
    db: &DatabaseConnection,
    category_id: i32,
) -> Result<Option<category::Model>> {
    Category::find_by_id(category_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a category. Names are unique; a collision surfaces as [`Error::DuplicateName`].
pub async fn create_category(
    db: &DatabaseConnection,
    name: String,
    description: Option<String>,
) -> Result<category::Model> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Category name cannot be empty"));
    }

    let category = category::ActiveModel {
        name: Set(name.clone()),
        description: Set(description.filter(|d| !d.trim().is_empty())),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match category.insert(db).await {
        Ok(created) => {
            tracing::info!(category_id = created.id, "Created category '{}'", created.name);
            Ok(created)
        }
        Err(e) if Error::is_unique_violation(&e) => Err(Error::DuplicateName { name }),
        Err(e) => Err(e.into()),
    }
}

/// Filters accepted by [`list_products`]. Everything is optional; the default lists
/// active products only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Admins also see inactive products
    pub admin: bool,
    /// Only products in this category
    pub category_id: Option<i32>,
    /// Case-insensitive substring of the name or description
    pub search: Option<String>,
    /// Inclusive lower price bound
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound
    pub max_price: Option<Decimal>,
    /// Report stock net of this user's cart
    pub user_id: Option<i32>,
}

/// A product as shown in listings.
///
/// When the listing was requested for a user with a cart, `stock` is what that
/// user can still add and `real_stock` carries the inventory count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListing {
    /// Product row, `stock` possibly adjusted
    #[serde(flatten)]
    pub product: product::Model,
    /// Persisted stock, present only when `stock` was adjusted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_stock: Option<i32>,
}

/// Case-insensitive substring match on name or description.
///
/// Done in Rust because `SQLite`'s `lower()` only folds ASCII.
fn matches_search(product: &product::Model, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

/// Lists products ordered by id, applying every filter in [`ProductFilter`].
pub async fn list_products(
    db: &DatabaseConnection,
    filter: &ProductFilter,
) -> Result<Vec<ProductListing>> {
    let mut query = Product::find();

    if !filter.admin {
        query = query.filter(product::Column::Active.eq(true));
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(product::Column::CategoryId.eq(category_id));
    }
    if let Some(min_price) = filter.min_price {
        query = query.filter(product::Column::Price.gte(min_price));
    }
    if let Some(max_price) = filter.max_price {
        query = query.filter(product::Column::Price.lte(max_price));
    }

    let mut products = query.order_by_asc(product::Column::Id).all(db).await?;

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        products.retain(|product| matches_search(product, &needle));
    }

    let reserved = match filter.user_id {
        Some(user_id) => cart::reserved_quantities(db, user_id).await?,
        None => None,
    };

    let listings = products
        .into_iter()
        .map(|product| match &reserved {
            Some(reserved) => {
                let held = reserved.get(&product.id).copied().unwrap_or(0);
                let real_stock = product.stock;
                ProductListing {
                    product: product::Model {
                        stock: (real_stock - held).max(0),
                        ..product
                    },
                    real_stock: Some(real_stock),
                }
            }
            None => ProductListing {
                product,
                real_stock: None,
            },
        })
        .collect();

    Ok(listings)
}

/// Retrieves a product by id, failing with [`Error::ProductNotFound`].
pub async fn get_product(db: &DatabaseConnection, product_id: i32) -> Result<product::Model> {
    Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })
}

/// Fields for a new product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    /// Product name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Unit price
    pub price: Decimal,
    /// Optional image URL
    pub image: Option<String>,
    /// Initial stock
    pub stock: i32,
    /// Visible to customers; defaults to true
    pub active: Option<bool>,
    /// Optional category
    pub category_id: Option<i32>,
}

/// Partial product update. `None` leaves a field untouched; for nullable columns
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    /// New name
    pub name: Option<String>,
    /// New description or clear
    pub description: Option<Option<String>>,
    /// New price
    pub price: Option<Decimal>,
    /// New image or clear
    pub image: Option<Option<String>>,
    /// New stock count
    pub stock: Option<i32>,
    /// New visibility
    pub active: Option<bool>,
    /// New category or detach
    pub category_id: Option<Option<i32>>,
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Product name cannot be empty"));
    }
    Ok(name.to_string())
}

fn validate_stock(stock: i32) -> Result<i32> {
    if stock < 0 {
        return Err(Error::validation(format!(
            "Stock cannot be negative, got {stock}"
        )));
    }
    Ok(stock)
}

async fn ensure_category_exists(db: &DatabaseConnection, category_id: Option<i32>) -> Result<()> {
    if let Some(id) = category_id {
        if get_category_by_id(db, id).await?.is_none() {
            return Err(Error::CategoryNotFound { id });
        }
    }
    Ok(())
}

/// Creates a product after validating name, price, stock and category.
pub async fn create_product(db: &DatabaseConnection, new: NewProduct) -> Result<product::Model> {
    let name = validate_name(&new.name)?;
    let price = money::validate_price(new.price)?;
    let stock = validate_stock(new.stock)?;
    ensure_category_exists(db, new.category_id).await?;

    let product = product::ActiveModel {
        name: Set(name),
        description: Set(new.description),
        price: Set(price),
        image: Set(new.image),
        stock: Set(stock),
        active: Set(new.active.unwrap_or(true)),
        category_id: Set(new.category_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let created = product.insert(db).await?;
    tracing::info!(product_id = created.id, "Created product '{}'", created.name);
    Ok(created)
}

/// Applies a partial update to a product.
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i32,
    changes: ProductChanges,
) -> Result<product::Model> {
    let mut product: product::ActiveModel = get_product(db, product_id).await?.into();

    if let Some(name) = changes.name {
        product.name = Set(validate_name(&name)?);
    }
    if let Some(description) = changes.description {
        product.description = Set(description);
    }
    if let Some(price) = changes.price {
        product.price = Set(money::validate_price(price)?);
    }
    if let Some(image) = changes.image {
        product.image = Set(image);
    }
    if let Some(stock) = changes.stock {
        product.stock = Set(validate_stock(stock)?);
    }
    if let Some(active) = changes.active {
        product.active = Set(active);
    }
    if let Some(category_id) = changes.category_id {
        ensure_category_exists(db, category_id).await?;
        product.category_id = Set(category_id);
    }

    product.update(db).await.map_err(Into::into)
}

/// Flips the `active` flag. Toggling twice restores the original value.
pub async fn toggle_active(db: &DatabaseConnection, product_id: i32) -> Result<product::Model> {
    let current = get_product(db, product_id).await?;
    let active = !current.active;

    let mut product: product::ActiveModel = current.into();
    product.active = Set(active);
    let updated = product.update(db).await?;

    tracing::info!(product_id, active, "Toggled product visibility");
    Ok(updated)
}

/// Deletes a product. Cart lines holding it go with it; past orders block the delete.
pub async fn delete_product(db: &DatabaseConnection, product_id: i32) -> Result<()> {
    let txn = db.begin().await?;

    Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    let referenced = OrderItem::find()
        .filter(order_item::Column::ProductId.eq(product_id))
        .count(&txn)
        .await?;
    if referenced > 0 {
        tracing::warn!(product_id, "Refusing to delete product referenced by orders");
        return Err(Error::ReferencedByOrder { id: product_id });
    }

    match Product::delete_by_id(product_id).exec(&txn).await {
        Ok(_) => {}
        Err(e) if Error::is_foreign_key_violation(&e) => {
            return Err(Error::ReferencedByOrder { id: product_id });
        }
        Err(e) => return Err(e.into()),
    }

    txn.commit().await?;
    tracing::info!(product_id, "Deleted product");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_category_duplicate_name() -> Result<()> {
        let db = setup_test_db().await?;

        let first = create_category(&db, "Laptops".to_string(), None).await?;
        assert_eq!(first.name, "Laptops");

        let result = create_category(&db, "Laptops".to_string(), Some("again".to_string())).await;
        assert!(matches!(result, Err(Error::DuplicateName { name }) if name == "Laptops"));

        assert_eq!(list_categories(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_categories_sorted_by_name() -> Result<()> {
        let db = setup_test_db().await?;
        create_category(&db, "Tablets".to_string(), None).await?;
        create_category(&db, "Audio".to_string(), Some("Headphones".to_string())).await?;

        let names: Vec<String> = list_categories(&db)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Audio", "Tablets"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let mut new = sample_new_product("  ", "1.00", 1);
        let result = create_product(&db, new.clone()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        new.name = "Mouse".to_string();
        new.price = Decimal::new(-100, 2);
        let result = create_product(&db, new.clone()).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));

        new.price = Decimal::ONE;
        new.stock = -1;
        let result = create_product(&db, new).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_unknown_category() -> Result<()> {
        let db = setup_test_db().await?;
        let mut new = sample_new_product("Mouse", "9.99", 3);
        new.category_id = Some(42);

        let result = create_product(&db, new).await;
        assert!(matches!(result, Err(Error::CategoryNotFound { id: 42 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_product_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = get_product(&db, 999).await;
        assert!(matches!(result, Err(Error::ProductNotFound { id: 999 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_non_admin_listing_only_shows_active() -> Result<()> {
        let db = setup_test_db().await?;
        let visible = create_custom_product(&db, "Visible", "10.00", 5).await?;
        let hidden = create_custom_product(&db, "Hidden", "10.00", 5).await?;
        toggle_active(&db, hidden.id).await?;

        let customer = list_products(&db, &ProductFilter::default()).await?;
        assert_eq!(customer.len(), 1);
        assert_eq!(customer[0].product.id, visible.id);
        assert!(customer.iter().all(|l| l.product.active));

        let admin = list_products(
            &db,
            &ProductFilter {
                admin: true,
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(admin.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_filters_by_category_search_and_price() -> Result<()> {
        let db = setup_test_db().await?;
        let audio = create_category(&db, "Audio".to_string(), None).await?;

        let mut headphones = sample_new_product("Sony WH-1000XM5", "379.99", 10);
        headphones.description = Some("Noise cancelling headphones".to_string());
        headphones.category_id = Some(audio.id);
        let headphones = create_product(&db, headphones).await?;

        let mut earbuds = sample_new_product("AirPods Pro", "249.99", 10);
        earbuds.category_id = Some(audio.id);
        let earbuds = create_product(&db, earbuds).await?;

        let laptop = create_custom_product(&db, "Laptop", "1499.99", 2).await?;

        let by_category = list_products(
            &db,
            &ProductFilter {
                category_id: Some(audio.id),
                ..Default::default()
            },
        )
        .await?;
        let ids: Vec<i32> = by_category.iter().map(|l| l.product.id).collect();
        assert_eq!(ids, vec![headphones.id, earbuds.id]);

        // Matches the description, case-insensitively
        let by_search = list_products(
            &db,
            &ProductFilter {
                search: Some("NOISE".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(by_search.len(), 1);
        assert_eq!(by_search[0].product.id, headphones.id);

        // Bounds are inclusive
        let by_price = list_products(
            &db,
            &ProductFilter {
                min_price: Some(Decimal::new(24999, 2)),
                max_price: Some(Decimal::new(37999, 2)),
                ..Default::default()
            },
        )
        .await?;
        let ids: Vec<i32> = by_price.iter().map(|l| l.product.id).collect();
        assert_eq!(ids, vec![headphones.id, earbuds.id]);
        assert!(!ids.contains(&laptop.id));

        Ok(())
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() -> Result<()> {
        let db = setup_test_db().await?;
        create_custom_product(&db, "100% Cotton Shirt", "20.00", 3).await?;
        create_custom_product(&db, "Plain Shirt", "15.00", 3).await?;

        let result = list_products(
            &db,
            &ProductFilter {
                search: Some("%".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].product.name, "100% Cotton Shirt");
        Ok(())
    }

    #[tokio::test]
    async fn test_search_folds_accented_case() -> Result<()> {
        let db = setup_test_db().await?;
        let camera = create_custom_product(&db, "CÁMARA Réflex", "899.00", 2).await?;
        create_custom_product(&db, "Trípode", "35.00", 8).await?;

        for term in ["cámara", "RÉFLEX", "Cámara ré"] {
            let result = list_products(
                &db,
                &ProductFilter {
                    search: Some(term.to_string()),
                    ..Default::default()
                },
            )
            .await?;
            assert_eq!(result.len(), 1, "search {term:?}");
            assert_eq!(result[0].product.id, camera.id);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_for_user_subtracts_cart_reservations() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "shopper@test.com").await?;
        let reserved = create_custom_product(&db, "Reserved", "10.00", 5).await?;
        let untouched = create_custom_product(&db, "Untouched", "10.00", 7).await?;
        cart::add_item(&db, user.id, reserved.id, 3).await?;

        let listings = list_products(
            &db,
            &ProductFilter {
                user_id: Some(user.id),
                ..Default::default()
            },
        )
        .await?;

        let reserved_listing = listings.iter().find(|l| l.product.id == reserved.id).unwrap();
        assert_eq!(reserved_listing.product.stock, 2);
        assert_eq!(reserved_listing.real_stock, Some(5));

        let untouched_listing = listings.iter().find(|l| l.product.id == untouched.id).unwrap();
        assert_eq!(untouched_listing.product.stock, 7);
        assert_eq!(untouched_listing.real_stock, Some(7));

        // Persisted stock is never touched by a listing
        assert_eq!(get_product(&db, reserved.id).await?.stock, 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_for_user_without_cart_is_unadjusted() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "nocart@test.com").await?;
        create_custom_product(&db, "Thing", "1.00", 4).await?;

        let listings = list_products(
            &db,
            &ProductFilter {
                user_id: Some(user.id),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(listings[0].product.stock, 4);
        assert_eq!(listings[0].real_stock, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_partial() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_category(&db, "Monitors".to_string(), None).await?;
        let mut new = sample_new_product("Monitor", "449.99", 18);
        new.description = Some("27 inch".to_string());
        new.category_id = Some(category.id);
        let product = create_product(&db, new).await?;

        let updated = update_product(
            &db,
            product.id,
            ProductChanges {
                price: Some(Decimal::new(39999, 2)),
                description: Some(None),
                category_id: Some(None),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.name, "Monitor");
        assert_eq!(updated.price, Decimal::new(39999, 2));
        assert_eq!(updated.stock, 18);
        assert_eq!(updated.description, None);
        assert_eq!(updated.category_id, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = update_product(&db, 7, ProductChanges::default()).await;
        assert!(matches!(result, Err(Error::ProductNotFound { id: 7 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_active_twice_restores_value() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_custom_product(&db, "Webcam", "199.99", 40).await?;
        assert!(product.active);

        let once = toggle_active(&db, product.id).await?;
        assert!(!once.active);
        let twice = toggle_active(&db, product.id).await?;
        assert!(twice.active);

        let result = toggle_active(&db, 999).await;
        assert!(matches!(result, Err(Error::ProductNotFound { id: 999 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product_cascades_cart_lines() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "cart@test.com").await?;
        let product = create_custom_product(&db, "Cable", "5.00", 10).await?;
        cart::add_item(&db, user.id, product.id, 2).await?;

        delete_product(&db, product.id).await?;

        assert!(Product::find_by_id(product.id).one(&db).await?.is_none());
        let (_, lines) = cart::get_cart_with_items(&db, user.id).await?;
        assert!(lines.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product_referenced_by_order() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "buyer@test.com").await?;
        let product = create_custom_product(&db, "SSD", "179.99", 5).await?;
        cart::add_item(&db, user.id, product.id, 1).await?;
        crate::core::order::create_order(&db, user.id).await?;

        let result = delete_product(&db, product.id).await;
        assert!(matches!(result, Err(Error::ReferencedByOrder { id }) if id == product.id));
        assert!(Product::find_by_id(product.id).one(&db).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = delete_product(&db, 31).await;
        assert!(matches!(result, Err(Error::ProductNotFound { id: 31 })));
        Ok(())
    }

    #[test]
    fn test_listing_serialization() {
        let listing = ProductListing {
            product: product::Model {
                id: 1,
                name: "Mouse".to_string(),
                description: None,
                price: Decimal::from(10),
                image: None,
                stock: 2,
                active: true,
                category_id: None,
                created_at: chrono::Utc::now(),
            },
            real_stock: Some(5),
        };
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["price"], "10.00");
        assert_eq!(json["stock"], 2);
        assert_eq!(json["realStock"], 5);
        assert!(json.get("categoryId").is_some());
    }
}
