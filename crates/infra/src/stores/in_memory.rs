//! In-memory stores for dev/tests.
//!
//! A single mutex per store serializes all writers, which trivially satisfies
//! the per-cart serialization the store contracts require. Totals returned
//! from mutations are recomputed from the live rows under the same lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use mokka_cart::{Cart, CartItem, NewCartItem};
use mokka_core::{CartId, CartItemId, MealId, OrderId, OrderItemId, UserId};
use mokka_orders::{NewOrder, Order, OrderItem};

use crate::error::StoreError;
use crate::stores::{CartItemStore, CartStore, OrderStore};

#[derive(Debug, Default)]
struct CartsInner {
    carts: HashMap<UserId, Cart>,
    next_id: i64,
}

/// In-memory `CartStore`.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    inner: Mutex<CartsInner>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, CartsInner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn create(&self, user_id: UserId) -> Result<Option<Cart>, StoreError> {
        let mut inner = self.lock()?;
        if inner.carts.contains_key(&user_id) {
            return Ok(None);
        }

        inner.next_id += 1;
        let cart = Cart::new(CartId::from_i64(inner.next_id), user_id, Utc::now());
        inner.carts.insert(user_id, cart.clone());
        Ok(Some(cart))
    }

    async fn get_by_user(&self, user_id: UserId) -> Result<Option<Cart>, StoreError> {
        Ok(self.lock()?.carts.get(&user_id).cloned())
    }

    async fn set_total_by_user(
        &self,
        user_id: UserId,
        total_price: Decimal,
    ) -> Result<Option<Cart>, StoreError> {
        let mut inner = self.lock()?;
        match inner.carts.get_mut(&user_id) {
            Some(cart) => {
                cart.total_price = total_price;
                Ok(Some(cart.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_by_user(&self, user_id: UserId) -> Result<bool, StoreError> {
        Ok(self.lock()?.carts.remove(&user_id).is_some())
    }
}

#[derive(Debug, Default)]
struct ItemsInner {
    items: BTreeMap<CartItemId, CartItem>,
    next_id: i64,
}

impl ItemsInner {
    fn cart_items_total(&self, cart_id: CartId) -> Decimal {
        self.items
            .values()
            .filter(|item| item.cart_id == cart_id)
            .map(|item| item.total_price)
            .sum()
    }
}

/// In-memory `CartItemStore`.
#[derive(Debug, Default)]
pub struct InMemoryCartItemStore {
    inner: Mutex<ItemsInner>,
}

impl InMemoryCartItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, ItemsInner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Synchronous drain used by `InMemoryOrderStore` so order placement
    /// never awaits between its insert and the cart drain.
    pub(crate) fn drain_cart(&self, cart_id: CartId) -> Result<u64, StoreError> {
        let mut inner = self.lock()?;
        let before = inner.items.len();
        inner.items.retain(|_, item| item.cart_id != cart_id);
        Ok((before - inner.items.len()) as u64)
    }
}

#[async_trait]
impl CartItemStore for InMemoryCartItemStore {
    async fn insert(&self, item: NewCartItem) -> Result<(CartItem, Decimal), StoreError> {
        let mut inner = self.lock()?;
        inner.next_id += 1;

        let stored = CartItem {
            id: CartItemId::from_i64(inner.next_id),
            cart_id: item.cart_id,
            meal_id: item.meal_id,
            meal_name: item.meal_name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_price: item.total_price(),
            created_at: Utc::now(),
        };
        inner.items.insert(stored.id, stored.clone());

        let total = inner.cart_items_total(stored.cart_id);
        Ok((stored, total))
    }

    async fn get(&self, item_id: CartItemId) -> Result<Option<CartItem>, StoreError> {
        Ok(self.lock()?.items.get(&item_id).cloned())
    }

    async fn get_by_cart_and_meal(
        &self,
        cart_id: CartId,
        meal_id: MealId,
    ) -> Result<Option<CartItem>, StoreError> {
        Ok(self
            .lock()?
            .items
            .values()
            .find(|item| item.cart_id == cart_id && item.meal_id == meal_id)
            .cloned())
    }

    async fn list_by_cart(&self, cart_id: CartId) -> Result<Vec<CartItem>, StoreError> {
        Ok(self
            .lock()?
            .items
            .values()
            .filter(|item| item.cart_id == cart_id)
            .cloned()
            .collect())
    }

    async fn update_quantity(
        &self,
        item_id: CartItemId,
        quantity: u32,
        total_price: Decimal,
    ) -> Result<Option<(CartItem, Decimal)>, StoreError> {
        let mut inner = self.lock()?;
        let Some(item) = inner.items.get_mut(&item_id) else {
            return Ok(None);
        };

        item.quantity = quantity;
        item.total_price = total_price;
        let updated = item.clone();

        let total = inner.cart_items_total(updated.cart_id);
        Ok(Some((updated, total)))
    }

    async fn delete(&self, item_id: CartItemId) -> Result<Option<Decimal>, StoreError> {
        let mut inner = self.lock()?;
        let Some(removed) = inner.items.remove(&item_id) else {
            return Ok(None);
        };
        Ok(Some(inner.cart_items_total(removed.cart_id)))
    }

    async fn delete_all_by_cart(&self, cart_id: CartId) -> Result<u64, StoreError> {
        self.drain_cart(cart_id)
    }
}

#[derive(Debug, Default)]
struct OrdersInner {
    orders: BTreeMap<OrderId, Order>,
    next_order_id: i64,
    next_item_id: i64,
}

/// In-memory `OrderStore`.
///
/// Holds the cart-item store it drains so placement stays a single
/// lock-to-lock step with no await in between (the in-process equivalent of
/// the Postgres one-transaction placement).
#[derive(Debug)]
pub struct InMemoryOrderStore {
    inner: Mutex<OrdersInner>,
    cart_items: Arc<InMemoryCartItemStore>,
}

impl InMemoryOrderStore {
    pub fn new(cart_items: Arc<InMemoryCartItemStore>) -> Self {
        Self {
            inner: Mutex::new(OrdersInner::default()),
            cart_items,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, OrdersInner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_from_cart(&self, order: NewOrder) -> Result<Order, StoreError> {
        let stored = {
            let mut inner = self.lock()?;
            inner.next_order_id += 1;
            let order_id = OrderId::from_i64(inner.next_order_id);
            let created_at = Utc::now();

            let items = order
                .items
                .into_iter()
                .map(|item| {
                    inner.next_item_id += 1;
                    OrderItem {
                        id: OrderItemId::from_i64(inner.next_item_id),
                        order_id,
                        meal_id: Some(item.meal_id),
                        meal_name: item.meal_name,
                        quantity: item.quantity,
                        unit_price: item.unit_price,
                        total_price: item.total_price,
                        created_at,
                    }
                })
                .collect();

            let stored = Order {
                id: order_id,
                user_id: order.user_id,
                cart_id: order.cart_id,
                delivery: order.delivery,
                total_price: order.total_price,
                status: order.status,
                payment_status: order.payment_status,
                payment_method: order.payment_method,
                scheduled_time: order.scheduled_time,
                delivered_at: None,
                created_at,
                items,
            };
            inner.orders.insert(order_id, stored.clone());
            stored
        };

        self.cart_items.drain_cart(stored.cart_id)?;
        Ok(stored)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        // Ids are assigned in insertion order, so reverse id order is
        // newest-first.
        Ok(self
            .lock()?
            .orders
            .values()
            .rev()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_by_user_and_id(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, StoreError> {
        Ok(self
            .lock()?
            .orders
            .get(&order_id)
            .filter(|order| order.user_id == user_id)
            .cloned())
    }

    async fn delete_one(&self, user_id: UserId, order_id: OrderId) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        let owned = inner
            .orders
            .get(&order_id)
            .is_some_and(|order| order.user_id == user_id);
        if owned {
            inner.orders.remove(&order_id);
        }
        Ok(owned)
    }

    async fn delete_all(&self, user_id: UserId) -> Result<u64, StoreError> {
        let mut inner = self.lock()?;
        let before = inner.orders.len();
        inner.orders.retain(|_, order| order.user_id != user_id);
        Ok((before - inner.orders.len()) as u64)
    }
}
