//! Cart business logic - one lazily created cart per user.
//!
//! Adding a product that is already in the cart merges the quantities, and the
//! merged quantity may never exceed the product's stock at the time of the call.
//! The read-check-write in [`add_item`] runs in a single transaction.

use crate::{
    core::account,
    entities::{Cart, CartItem, Product, cart, cart_item, product},
    errors::{Error, Result},
};
use sea_orm::{DatabaseTransaction, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::HashMap;

/// A cart line together with the product it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    /// Cart item id, used to remove the line
    pub id: i32,
    /// Units reserved
    pub quantity: i32,
    /// Current product row
    pub product: product::Model,
}

/// Finds the user's cart, if one was ever created.
pub async fn find_cart<C>(db: &C, user_id: i32) -> Result<Option<cart::Model>>
where
    C: ConnectionTrait,
{
    Cart::find()
        .filter(cart::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the user's cart, creating it on first access.
///
/// `carts.user_id` is unique, so a concurrent creator losing the race simply
/// re-reads the winner's row.
pub async fn get_or_create_cart<C>(db: &C, user_id: i32) -> Result<cart::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = find_cart(db, user_id).await? {
        return Ok(existing);
    }

    account::get_user_by_id(db, user_id)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    let now = chrono::Utc::now();
    let cart = cart::ActiveModel {
        user_id: Set(user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match cart.insert(db).await {
        Ok(created) => {
            tracing::debug!(user_id, cart_id = created.id, "Created cart");
            Ok(created)
        }
        Err(e) if Error::is_unique_violation(&e) => find_cart(db, user_id)
            .await?
            .ok_or(Error::UserNotFound { id: user_id }),
        Err(e) => Err(e.into()),
    }
}

/// Loads the lines of a cart joined with their products, oldest first.
pub async fn cart_lines<C>(db: &C, cart_id: i32) -> Result<Vec<(cart_item::Model, product::Model)>>
where
    C: ConnectionTrait,
{
    let rows = CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .find_also_related(Product)
        .order_by_asc(cart_item::Column::Id)
        .all(db)
        .await?;

    // Lines are deleted together with their product, so the join always matches
    Ok(rows
        .into_iter()
        .filter_map(|(item, product)| product.map(|product| (item, product)))
        .collect())
}

/// Returns the user's cart (creating it if needed) and its lines.
pub async fn get_cart_with_items(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<(cart::Model, Vec<CartLine>)> {
    let cart = get_or_create_cart(db, user_id).await?;
    let lines = cart_lines(db, cart.id)
        .await?
        .into_iter()
        .map(|(item, product)| CartLine {
            id: item.id,
            quantity: item.quantity,
            product,
        })
        .collect();
    Ok((cart, lines))
}

/// Quantity per product held in the user's cart, or `None` when the user has no cart.
pub async fn reserved_quantities(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Option<HashMap<i32, i32>>> {
    let Some(cart) = find_cart(db, user_id).await? else {
        return Ok(None);
    };

    let items = CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .all(db)
        .await?;

    let mut reserved = HashMap::with_capacity(items.len());
    for item in items {
        *reserved.entry(item.product_id).or_insert(0) += item.quantity;
    }
    Ok(Some(reserved))
}

async fn upsert_line(
    txn: &DatabaseTransaction,
    cart_id: i32,
    product: &product::Model,
    quantity: i32,
) -> Result<cart_item::Model> {
    let existing = CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .filter(cart_item::Column::ProductId.eq(product.id))
        .one(txn)
        .await?;

    let new_quantity = match &existing {
        Some(item) => item.quantity.checked_add(quantity),
        None => Some(quantity),
    }
    .filter(|total| *total <= product.stock);

    let Some(new_quantity) = new_quantity else {
        tracing::warn!(
            product_id = product.id,
            requested = quantity,
            available = product.stock,
            "Cart quantity exceeds stock"
        );
        return Err(Error::InsufficientStock {
            product: product.name.clone(),
            available: product.stock,
        });
    };

    match existing {
        Some(item) => {
            let mut item: cart_item::ActiveModel = item.into();
            item.quantity = Set(new_quantity);
            item.update(txn).await.map_err(Into::into)
        }
        None => cart_item::ActiveModel {
            cart_id: Set(cart_id),
            product_id: Set(product.id),
            quantity: Set(new_quantity),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(Into::into),
    }
}

/// Adds `quantity` units of a product to the user's cart, merging with an existing line.
///
/// # Errors
/// - [`Error::Validation`] when `quantity < 1`
/// - [`Error::ProductNotFound`] when the product does not exist
/// - [`Error::InsufficientStock`] when the merged quantity exceeds the product's stock
#[tracing::instrument(skip(db))]
pub async fn add_item(
    db: &DatabaseConnection,
    user_id: i32,
    product_id: i32,
    quantity: i32,
) -> Result<cart_item::Model> {
    if quantity < 1 {
        return Err(Error::validation(format!(
            "Quantity must be at least 1, got {quantity}"
        )));
    }

    let txn = db.begin().await?;

    let product = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    let cart = get_or_create_cart(&txn, user_id).await?;
    let item = upsert_line(&txn, cart.id, &product, quantity).await?;

    let mut touched: cart::ActiveModel = cart.into();
    touched.updated_at = Set(chrono::Utc::now());
    touched.update(&txn).await?;

    txn.commit().await?;
    tracing::info!(cart_item_id = item.id, quantity = item.quantity, "Cart line saved");
    Ok(item)
}

/// Removes a cart line. Removing an unknown id is not an error.
pub async fn remove_item(db: &DatabaseConnection, item_id: i32) -> Result<()> {
    let result = CartItem::delete_by_id(item_id).exec(db).await?;
    tracing::debug!(item_id, removed = result.rows_affected, "Removed cart line");
    Ok(())
}

/// Empties a cart, keeping the cart row for reuse. Returns the number of lines removed.
pub async fn clear_cart<C>(db: &C, cart_id: i32) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = CartItem::delete_many()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_add_item_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = add_item(&db, 1, 1, 0).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = add_item(&db, 1, 1, -3).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_add_item_huge_quantity_on_existing_line() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "overflow@test.com").await?;
        let product = create_custom_product(&db, "Webcam", "59.99", 10).await?;

        add_item(&db, user.id, product.id, 2).await?;
        let result = add_item(&db, user.id, product.id, i32::MAX).await;
        assert!(matches!(
            result,
            Err(Error::InsufficientStock { available: 10, .. })
        ));

        let (_, lines) = get_cart_with_items(&db, user.id).await?;
        assert_eq!(lines[0].quantity, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_or_create_cart_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "idem@test.com").await?;

        let first = get_or_create_cart(&db, user.id).await?;
        let second = get_or_create_cart(&db, user.id).await?;
        assert_eq!(first.id, second.id);

        let carts = Cart::find()
            .filter(cart::Column::UserId.eq(user.id))
            .count(&db)
            .await?;
        assert_eq!(carts, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_or_create_cart_unknown_user() -> Result<()> {
        let db = setup_test_db().await?;
        let result = get_or_create_cart(&db, 404).await;
        assert!(matches!(result, Err(Error::UserNotFound { id: 404 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_add_item_merges_quantities() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "merge@test.com").await?;
        let product = create_custom_product(&db, "Keyboard", "189.99", 10).await?;

        let first = add_item(&db, user.id, product.id, 2).await?;
        let second = add_item(&db, user.id, product.id, 3).await?;

        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 5);

        let (_, lines) = get_cart_with_items(&db, user.id).await?;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(lines[0].product.id, product.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_item_rejects_more_than_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "greedy@test.com").await?;
        let product = create_custom_product(&db, "PS5", "449.99", 3).await?;

        let result = add_item(&db, user.id, product.id, 5).await;
        assert!(matches!(
            result,
            Err(Error::InsufficientStock { available: 3, .. })
        ));

        // Merged quantity is checked too
        add_item(&db, user.id, product.id, 2).await?;
        let result = add_item(&db, user.id, product.id, 2).await;
        assert!(matches!(
            result,
            Err(Error::InsufficientStock { available: 3, .. })
        ));

        let (_, lines) = get_cart_with_items(&db, user.id).await?;
        assert_eq!(lines[0].quantity, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_item_unknown_product() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "ghost@test.com").await?;

        let result = add_item(&db, user.id, 999, 1).await;
        assert!(matches!(result, Err(Error::ProductNotFound { id: 999 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_item_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "remove@test.com").await?;
        let product = create_custom_product(&db, "Mouse", "99.99", 4).await?;
        let item = add_item(&db, user.id, product.id, 1).await?;

        remove_item(&db, item.id).await?;
        remove_item(&db, item.id).await?;
        remove_item(&db, 12345).await?;

        let (_, lines) = get_cart_with_items(&db, user.id).await?;
        assert!(lines.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_reserved_quantities() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "reserve@test.com").await?;
        assert!(reserved_quantities(&db, user.id).await?.is_none());

        let a = create_custom_product(&db, "A", "1.00", 10).await?;
        let b = create_custom_product(&db, "B", "1.00", 10).await?;
        add_item(&db, user.id, a.id, 4).await?;
        add_item(&db, user.id, b.id, 1).await?;

        let reserved = reserved_quantities(&db, user.id).await?.unwrap();
        assert_eq!(reserved.get(&a.id), Some(&4));
        assert_eq!(reserved.get(&b.id), Some(&1));
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_cart_keeps_cart_row() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "clear@test.com").await?;
        let product = create_custom_product(&db, "Cable", "3.00", 10).await?;
        add_item(&db, user.id, product.id, 2).await?;

        let cart = get_or_create_cart(&db, user.id).await?;
        assert_eq!(clear_cart(&db, cart.id).await?, 1);

        let (same_cart, lines) = get_cart_with_items(&db, user.id).await?;
        assert_eq!(same_cart.id, cart.id);
        assert!(lines.is_empty());
        Ok(())
    }
}
