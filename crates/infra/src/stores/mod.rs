//! Storage abstractions for carts, cart items and orders.
//!
//! Stores own transaction boundaries. Every cart-item mutation runs inside
//! one storage transaction that serializes writers per cart and returns the
//! post-mutation `SUM(total_price)` over that cart's items, so callers
//! publish aggregate totals that were never derived from stale state.
//! Order placement is likewise a single transaction spanning the order
//! insert, its item inserts and the cart drain.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use mokka_cart::{Cart, CartItem, NewCartItem};
use mokka_core::{CartId, CartItemId, MealId, OrderId, UserId};
use mokka_orders::{NewOrder, Order};

use crate::error::StoreError;

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryCartItemStore, InMemoryCartStore, InMemoryOrderStore};
pub use postgres::{PostgresCartItemStore, PostgresCartStore, PostgresMealLookup, PostgresOrderStore};

/// Owns the `Cart` aggregate row (one per user), including the cached total.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Insert an empty cart for the user. `Ok(None)` when one already exists.
    async fn create(&self, user_id: UserId) -> Result<Option<Cart>, StoreError>;

    async fn get_by_user(&self, user_id: UserId) -> Result<Option<Cart>, StoreError>;

    /// Unconditional (last-write-wins) write of the cached total, applied by
    /// the totals projector. `Ok(None)` when no cart exists for the user.
    async fn set_total_by_user(
        &self,
        user_id: UserId,
        total_price: Decimal,
    ) -> Result<Option<Cart>, StoreError>;

    /// Returns `true` when a cart was deleted (line items cascade).
    async fn delete_by_user(&self, user_id: UserId) -> Result<bool, StoreError>;
}

/// Owns `CartItem` rows.
///
/// Mutations return the cart's items total computed inside the same
/// transaction (see module docs).
#[async_trait]
pub trait CartItemStore: Send + Sync {
    /// Insert a line item; returns the stored row and the cart's post-insert
    /// items total.
    async fn insert(&self, item: NewCartItem) -> Result<(CartItem, Decimal), StoreError>;

    async fn get(&self, item_id: CartItemId) -> Result<Option<CartItem>, StoreError>;

    async fn get_by_cart_and_meal(
        &self,
        cart_id: CartId,
        meal_id: MealId,
    ) -> Result<Option<CartItem>, StoreError>;

    async fn list_by_cart(&self, cart_id: CartId) -> Result<Vec<CartItem>, StoreError>;

    /// Set a line's quantity and line total; returns the updated row and the
    /// cart's post-update items total. `Ok(None)` when the row is gone.
    async fn update_quantity(
        &self,
        item_id: CartItemId,
        quantity: u32,
        total_price: Decimal,
    ) -> Result<Option<(CartItem, Decimal)>, StoreError>;

    /// Delete a line; returns the cart's post-delete items total. `Ok(None)`
    /// when the row is gone.
    async fn delete(&self, item_id: CartItemId) -> Result<Option<Decimal>, StoreError>;

    /// Delete every line in the cart; returns how many rows went away.
    async fn delete_all_by_cart(&self, cart_id: CartId) -> Result<u64, StoreError>;
}

/// Owns `Order` + `OrderItem` rows.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist the order with its items and drain the originating cart's
    /// line items, all in one transaction. Returns the materialized order.
    async fn create_from_cart(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Newest first, items eagerly loaded.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError>;

    async fn get_by_user_and_id(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, StoreError>;

    /// Returns `true` when an order was deleted.
    async fn delete_one(&self, user_id: UserId, order_id: OrderId) -> Result<bool, StoreError>;

    /// Delete all of a user's orders; returns how many went away.
    async fn delete_all(&self, user_id: UserId) -> Result<u64, StoreError>;
}

#[async_trait]
impl<S> CartStore for Arc<S>
where
    S: CartStore + ?Sized,
{
    async fn create(&self, user_id: UserId) -> Result<Option<Cart>, StoreError> {
        (**self).create(user_id).await
    }

    async fn get_by_user(&self, user_id: UserId) -> Result<Option<Cart>, StoreError> {
        (**self).get_by_user(user_id).await
    }

    async fn set_total_by_user(
        &self,
        user_id: UserId,
        total_price: Decimal,
    ) -> Result<Option<Cart>, StoreError> {
        (**self).set_total_by_user(user_id, total_price).await
    }

    async fn delete_by_user(&self, user_id: UserId) -> Result<bool, StoreError> {
        (**self).delete_by_user(user_id).await
    }
}

#[async_trait]
impl<S> CartItemStore for Arc<S>
where
    S: CartItemStore + ?Sized,
{
    async fn insert(&self, item: NewCartItem) -> Result<(CartItem, Decimal), StoreError> {
        (**self).insert(item).await
    }

    async fn get(&self, item_id: CartItemId) -> Result<Option<CartItem>, StoreError> {
        (**self).get(item_id).await
    }

    async fn get_by_cart_and_meal(
        &self,
        cart_id: CartId,
        meal_id: MealId,
    ) -> Result<Option<CartItem>, StoreError> {
        (**self).get_by_cart_and_meal(cart_id, meal_id).await
    }

    async fn list_by_cart(&self, cart_id: CartId) -> Result<Vec<CartItem>, StoreError> {
        (**self).list_by_cart(cart_id).await
    }

    async fn update_quantity(
        &self,
        item_id: CartItemId,
        quantity: u32,
        total_price: Decimal,
    ) -> Result<Option<(CartItem, Decimal)>, StoreError> {
        (**self).update_quantity(item_id, quantity, total_price).await
    }

    async fn delete(&self, item_id: CartItemId) -> Result<Option<Decimal>, StoreError> {
        (**self).delete(item_id).await
    }

    async fn delete_all_by_cart(&self, cart_id: CartId) -> Result<u64, StoreError> {
        (**self).delete_all_by_cart(cart_id).await
    }
}

#[async_trait]
impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    async fn create_from_cart(&self, order: NewOrder) -> Result<Order, StoreError> {
        (**self).create_from_cart(order).await
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        (**self).list_by_user(user_id).await
    }

    async fn get_by_user_and_id(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, StoreError> {
        (**self).get_by_user_and_id(user_id, order_id).await
    }

    async fn delete_one(&self, user_id: UserId, order_id: OrderId) -> Result<bool, StoreError> {
        (**self).delete_one(user_id, order_id).await
    }

    async fn delete_all(&self, user_id: UserId) -> Result<u64, StoreError> {
        (**self).delete_all(user_id).await
    }
}
