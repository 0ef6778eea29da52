//! Order business logic - turns a cart into an immutable order.
//!
//! Checkout runs as one database transaction: the cart is read, every line is
//! validated against current stock, the order and its price snapshots are written,
//! stock is decremented and the cart is emptied. Any failure rolls everything back,
//! so an order either exists with all its items and stock effects or not at all.
//!
//! Stock is decremented with a guarded atomic update
//! (`UPDATE products SET stock = stock - q WHERE id = ? AND stock >= q`), so even a
//! checkout that raced past validation cannot drive stock negative.

use crate::{
    core::{cart, money},
    entities::{Order, OrderItem, OrderStatus, Product, order, order_item, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;

/// An order together with its line snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetails {
    /// Order row
    #[serde(flatten)]
    pub order: order::Model,
    /// Purchased lines, in cart order
    pub items: Vec<order_item::Model>,
}

/// Decrements a product's stock by `quantity`, refusing to go below zero.
///
/// The check and the write are a single statement. When no row is updated the
/// product is re-read to report what is actually available.
pub async fn decrement_stock_atomic<C>(db: &C, product_id: i32, quantity: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::Stock.gte(quantity))
        .exec(db)
        .await?;

    if result.rows_affected == 1 {
        return Ok(());
    }

    let current = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;
    Err(Error::InsufficientStock {
        product: current.name,
        available: current.stock,
    })
}

/// Places an order for everything in the user's cart.
///
/// # Errors
/// - [`Error::EmptyCart`] when the user has no cart or it has no lines
/// - [`Error::InsufficientStock`] naming the first line whose quantity exceeds stock
///
/// On error nothing is written: no order, no items, no stock change, cart intact.
#[tracing::instrument(skip(db))]
pub async fn create_order(db: &DatabaseConnection, user_id: i32) -> Result<OrderDetails> {
    let txn = db.begin().await?;

    let cart = cart::find_cart(&txn, user_id).await?.ok_or(Error::EmptyCart)?;
    let lines = cart::cart_lines(&txn, cart.id).await?;
    if lines.is_empty() {
        tracing::warn!(user_id, "Checkout attempted with an empty cart");
        return Err(Error::EmptyCart);
    }

    // Validate every line before writing anything
    if let Some((item, product)) = lines.iter().find(|(item, product)| product.stock < item.quantity) {
        tracing::warn!(
            user_id,
            product_id = product.id,
            requested = item.quantity,
            available = product.stock,
            "Checkout rejected for insufficient stock"
        );
        return Err(Error::InsufficientStock {
            product: product.name.clone(),
            available: product.stock,
        });
    }

    let total = money::line_total(lines.iter().map(|(item, product)| (product.price, item.quantity)));
    let now = chrono::Utc::now();

    let order = order::ActiveModel {
        user_id: Set(user_id),
        total: Set(total),
        status: Set(OrderStatus::Pending),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for (item, product) in &lines {
        let snapshot = order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(product.id),
            quantity: Set(item.quantity),
            price: Set(money::round(product.price)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        decrement_stock_atomic(&txn, product.id, item.quantity).await?;
        items.push(snapshot);
    }

    let cleared = cart::clear_cart(&txn, cart.id).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = order.id,
        user_id,
        total = %total,
        lines = items.len(),
        cleared,
        "Order placed"
    );
    Ok(OrderDetails { order, items })
}

/// Lists a user's orders, newest first.
pub async fn list_orders_for_user(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<order::Model>> {
    Order::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an order with its items.
pub async fn get_order(db: &DatabaseConnection, order_id: i32) -> Result<OrderDetails> {
    let order = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })?;

    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?;

    Ok(OrderDetails { order, items })
}

/// Moves a pending order to `completed` or `cancelled`.
///
/// Cancelling does not return stock.
pub async fn update_order_status(
    db: &DatabaseConnection,
    order_id: i32,
    status: OrderStatus,
) -> Result<order::Model> {
    let current = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })?;

    if current.status != OrderStatus::Pending || status == OrderStatus::Pending {
        return Err(Error::validation(format!(
            "Cannot move order {order_id} from {:?} to {status:?}",
            current.status
        )));
    }

    let mut order: order::ActiveModel = current.into();
    order.status = Set(status);
    let updated = order.update(db).await?;

    tracing::info!(order_id, status = ?updated.status, "Order status changed");
    Ok(updated)
}
