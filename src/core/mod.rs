//! Core business logic - framework-agnostic catalog, cart, order and account operations.
//!
//! Every function takes a `SeaORM` connection and returns [`crate::errors::Result`];
//! nothing here knows about HTTP.

/// Registration, login and password hashing
pub mod account;
/// Per-user carts and their lines
pub mod cart;
/// Categories and products
pub mod catalog;
/// Decimal rounding and formatting for prices and totals
pub mod money;
/// Checkout and order history
pub mod order;
