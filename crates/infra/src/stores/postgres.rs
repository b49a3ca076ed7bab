//! Postgres-backed stores (sqlx, runtime queries).
//!
//! Concurrency contract: every cart-item mutation locks the owning cart row
//! (`SELECT … FOR UPDATE`) before touching lines, then reads the items total
//! from the same transaction. Order placement writes the order, its items and
//! the cart drain in one transaction.
//!
//! The schema these queries run against is documented in `schema.sql` at the
//! repository root; applying it is an operational concern.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use mokka_cart::{Cart, CartItem, NewCartItem};
use mokka_catalog::{CatalogError, MealLookup, MealSnapshot};
use mokka_core::{CartId, CartItemId, MealId, OrderId, OrderItemId, UserId};
use mokka_orders::{
    DeliveryDetails, NewOrder, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus,
};

use crate::error::StoreError;
use crate::stores::{CartItemStore, CartStore, OrderStore};

fn map_sqlx_error(operation: &'static str, error: sqlx::Error) -> StoreError {
    StoreError::backend(operation, error)
}

fn cart_from_row(row: &PgRow) -> Result<Cart, StoreError> {
    let decode = |e: sqlx::Error| StoreError::backend("decode_cart", e);
    Ok(Cart {
        id: CartId::from_i64(row.try_get("id").map_err(decode)?),
        user_id: UserId::from_i64(row.try_get("user_id").map_err(decode)?),
        total_price: row.try_get("total_price").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

fn cart_item_from_row(row: &PgRow) -> Result<CartItem, StoreError> {
    let decode = |e: sqlx::Error| StoreError::backend("decode_cart_item", e);
    let quantity: i64 = row.try_get("quantity").map_err(decode)?;
    Ok(CartItem {
        id: CartItemId::from_i64(row.try_get("id").map_err(decode)?),
        cart_id: CartId::from_i64(row.try_get("cart_id").map_err(decode)?),
        meal_id: MealId::from_i64(row.try_get("meal_id").map_err(decode)?),
        meal_name: row.try_get("meal_name").map_err(decode)?,
        quantity: u32::try_from(quantity)
            .map_err(|e| StoreError::backend("decode_cart_item", e))?,
        unit_price: row.try_get("unit_price").map_err(decode)?,
        total_price: row.try_get("total_price").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

fn order_from_row(row: &PgRow, items: Vec<OrderItem>) -> Result<Order, StoreError> {
    let decode = |e: sqlx::Error| StoreError::backend("decode_order", e);
    let parse = |e: mokka_core::DomainError| StoreError::backend("decode_order", e);

    let status: String = row.try_get("status").map_err(decode)?;
    let payment_status: String = row.try_get("payment_status").map_err(decode)?;
    let payment_method: String = row.try_get("payment_method").map_err(decode)?;

    Ok(Order {
        id: OrderId::from_i64(row.try_get("id").map_err(decode)?),
        user_id: UserId::from_i64(row.try_get("user_id").map_err(decode)?),
        cart_id: CartId::from_i64(row.try_get("cart_id").map_err(decode)?),
        delivery: DeliveryDetails {
            delivery_address: row.try_get("delivery_address").map_err(decode)?,
            delivery_latitude: row.try_get("delivery_latitude").map_err(decode)?,
            delivery_longitude: row.try_get("delivery_longitude").map_err(decode)?,
            house_number: row.try_get("house_number").map_err(decode)?,
            entrance_number: row.try_get("entrance_number").map_err(decode)?,
            level: row.try_get("level").map_err(decode)?,
            apartment_number: row.try_get("apartment_number").map_err(decode)?,
            delivery_notes: row.try_get("delivery_notes").map_err(decode)?,
            phone_number: row.try_get("phone_number").map_err(decode)?,
        },
        total_price: row.try_get("total_price").map_err(decode)?,
        status: status.parse::<OrderStatus>().map_err(parse)?,
        payment_status: payment_status.parse::<PaymentStatus>().map_err(parse)?,
        payment_method: payment_method.parse::<PaymentMethod>().map_err(parse)?,
        scheduled_time: row.try_get("scheduled_time").map_err(decode)?,
        delivered_at: row.try_get("delivered_at").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
        items,
    })
}

fn order_item_from_row(row: &PgRow) -> Result<OrderItem, StoreError> {
    let decode = |e: sqlx::Error| StoreError::backend("decode_order_item", e);
    let quantity: i64 = row.try_get("quantity").map_err(decode)?;
    let meal_id: Option<i64> = row.try_get("meal_id").map_err(decode)?;
    Ok(OrderItem {
        id: OrderItemId::from_i64(row.try_get("id").map_err(decode)?),
        order_id: OrderId::from_i64(row.try_get("order_id").map_err(decode)?),
        meal_id: meal_id.map(MealId::from_i64),
        meal_name: row.try_get("meal_name").map_err(decode)?,
        quantity: u32::try_from(quantity)
            .map_err(|e| StoreError::backend("decode_order_item", e))?,
        unit_price: row.try_get("unit_price").map_err(decode)?,
        total_price: row.try_get("total_price").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

/// Take the per-cart write lock inside an open transaction.
async fn lock_cart_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    cart_id: CartId,
    operation: &'static str,
) -> Result<(), StoreError> {
    sqlx::query("SELECT id FROM carts WHERE id = $1 FOR UPDATE")
        .bind(cart_id.as_i64())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;
    Ok(())
}

/// Items total for a cart, read inside an open transaction.
async fn cart_items_total(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    cart_id: CartId,
    operation: &'static str,
) -> Result<Decimal, StoreError> {
    let row = sqlx::query(
        "SELECT COALESCE(SUM(total_price), 0) AS items_total FROM cart_items WHERE cart_id = $1",
    )
    .bind(cart_id.as_i64())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error(operation, e))?;

    row.try_get("items_total")
        .map_err(|e| map_sqlx_error(operation, e))
}

/// Postgres-backed `CartStore`.
pub struct PostgresCartStore {
    pool: PgPool,
}

impl PostgresCartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PostgresCartStore {
    async fn create(&self, user_id: UserId) -> Result<Option<Cart>, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO carts (user_id, total_price)
            VALUES ($1, 0)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING id, user_id, total_price, created_at
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_cart", e))?;

        row.as_ref().map(cart_from_row).transpose()
    }

    async fn get_by_user(&self, user_id: UserId) -> Result<Option<Cart>, StoreError> {
        let row = sqlx::query(
            "SELECT id, user_id, total_price, created_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_cart_by_user", e))?;

        row.as_ref().map(cart_from_row).transpose()
    }

    async fn set_total_by_user(
        &self,
        user_id: UserId,
        total_price: Decimal,
    ) -> Result<Option<Cart>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE carts
            SET total_price = $2
            WHERE user_id = $1
            RETURNING id, user_id, total_price, created_at
            "#,
        )
        .bind(user_id.as_i64())
        .bind(total_price)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_cart_total", e))?;

        row.as_ref().map(cart_from_row).transpose()
    }

    async fn delete_by_user(&self, user_id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_cart", e))?;

        Ok(result.rows_affected() > 0)
    }
}

/// Postgres-backed `CartItemStore`.
pub struct PostgresCartItemStore {
    pool: PgPool,
}

impl PostgresCartItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartItemStore for PostgresCartItemStore {
    async fn insert(&self, item: NewCartItem) -> Result<(CartItem, Decimal), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("insert_cart_item", e))?;

        lock_cart_row(&mut tx, item.cart_id, "insert_cart_item").await?;

        let total_price = item.total_price();
        let row = sqlx::query(
            r#"
            INSERT INTO cart_items (cart_id, meal_id, meal_name, quantity, unit_price, total_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, cart_id, meal_id, meal_name, quantity, unit_price, total_price, created_at
            "#,
        )
        .bind(item.cart_id.as_i64())
        .bind(item.meal_id.as_i64())
        .bind(&item.meal_name)
        .bind(i64::from(item.quantity))
        .bind(item.unit_price)
        .bind(total_price)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_cart_item", e))?;

        let stored = cart_item_from_row(&row)?;
        let items_total = cart_items_total(&mut tx, stored.cart_id, "insert_cart_item").await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("insert_cart_item", e))?;

        Ok((stored, items_total))
    }

    async fn get(&self, item_id: CartItemId) -> Result<Option<CartItem>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, cart_id, meal_id, meal_name, quantity, unit_price, total_price, created_at
            FROM cart_items
            WHERE id = $1
            "#,
        )
        .bind(item_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_cart_item", e))?;

        row.as_ref().map(cart_item_from_row).transpose()
    }

    async fn get_by_cart_and_meal(
        &self,
        cart_id: CartId,
        meal_id: MealId,
    ) -> Result<Option<CartItem>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, cart_id, meal_id, meal_name, quantity, unit_price, total_price, created_at
            FROM cart_items
            WHERE cart_id = $1 AND meal_id = $2
            "#,
        )
        .bind(cart_id.as_i64())
        .bind(meal_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_cart_item_by_meal", e))?;

        row.as_ref().map(cart_item_from_row).transpose()
    }

    async fn list_by_cart(&self, cart_id: CartId) -> Result<Vec<CartItem>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, cart_id, meal_id, meal_name, quantity, unit_price, total_price, created_at
            FROM cart_items
            WHERE cart_id = $1
            ORDER BY id
            "#,
        )
        .bind(cart_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_cart_items", e))?;

        rows.iter().map(cart_item_from_row).collect()
    }

    async fn update_quantity(
        &self,
        item_id: CartItemId,
        quantity: u32,
        total_price: Decimal,
    ) -> Result<Option<(CartItem, Decimal)>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_cart_item", e))?;

        let Some(row) = sqlx::query("SELECT cart_id FROM cart_items WHERE id = $1")
            .bind(item_id.as_i64())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_cart_item", e))?
        else {
            return Ok(None);
        };
        let cart_id = CartId::from_i64(
            row.try_get("cart_id")
                .map_err(|e| map_sqlx_error("update_cart_item", e))?,
        );

        lock_cart_row(&mut tx, cart_id, "update_cart_item").await?;

        // The row may have been removed between the lookup and the lock; the
        // RETURNING clause is the authoritative answer.
        let Some(row) = sqlx::query(
            r#"
            UPDATE cart_items
            SET quantity = $2, total_price = $3
            WHERE id = $1
            RETURNING id, cart_id, meal_id, meal_name, quantity, unit_price, total_price, created_at
            "#,
        )
        .bind(item_id.as_i64())
        .bind(i64::from(quantity))
        .bind(total_price)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_cart_item", e))?
        else {
            return Ok(None);
        };

        let updated = cart_item_from_row(&row)?;
        let items_total = cart_items_total(&mut tx, cart_id, "update_cart_item").await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_cart_item", e))?;

        Ok(Some((updated, items_total)))
    }

    async fn delete(&self, item_id: CartItemId) -> Result<Option<Decimal>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete_cart_item", e))?;

        let Some(row) = sqlx::query("SELECT cart_id FROM cart_items WHERE id = $1")
            .bind(item_id.as_i64())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_cart_item", e))?
        else {
            return Ok(None);
        };
        let cart_id = CartId::from_i64(
            row.try_get("cart_id")
                .map_err(|e| map_sqlx_error("delete_cart_item", e))?,
        );

        lock_cart_row(&mut tx, cart_id, "delete_cart_item").await?;

        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(item_id.as_i64())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_cart_item", e))?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let items_total = cart_items_total(&mut tx, cart_id, "delete_cart_item").await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete_cart_item", e))?;

        Ok(Some(items_total))
    }

    async fn delete_all_by_cart(&self, cart_id: CartId) -> Result<u64, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete_all_cart_items", e))?;

        lock_cart_row(&mut tx, cart_id, "delete_all_cart_items").await?;

        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_i64())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_all_cart_items", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete_all_cart_items", e))?;

        Ok(result.rows_affected())
    }
}

/// Postgres-backed `OrderStore`.
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, meal_id, meal_name, quantity, unit_price, total_price, created_at
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_order_items", e))?;

        rows.iter().map(order_item_from_row).collect()
    }
}

const ORDER_COLUMNS: &str = "id, user_id, cart_id, delivery_address, delivery_latitude, \
     delivery_longitude, house_number, entrance_number, level, apartment_number, \
     delivery_notes, phone_number, total_price, status, payment_status, payment_method, \
     scheduled_time, delivered_at, created_at";

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create_from_cart(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_order", e))?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (
                user_id, cart_id, delivery_address, delivery_latitude, delivery_longitude,
                house_number, entrance_number, level, apartment_number, delivery_notes,
                phone_number, total_price, status, payment_status, payment_method, scheduled_time
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.user_id.as_i64())
        .bind(order.cart_id.as_i64())
        .bind(&order.delivery.delivery_address)
        .bind(order.delivery.delivery_latitude)
        .bind(order.delivery.delivery_longitude)
        .bind(&order.delivery.house_number)
        .bind(&order.delivery.entrance_number)
        .bind(&order.delivery.level)
        .bind(&order.delivery.apartment_number)
        .bind(&order.delivery.delivery_notes)
        .bind(&order.delivery.phone_number)
        .bind(order.total_price)
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.payment_method.as_str())
        .bind(order.scheduled_time)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_order", e))?;

        let order_id = OrderId::from_i64(
            row.try_get("id")
                .map_err(|e| map_sqlx_error("create_order", e))?,
        );

        let mut items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let item_row = sqlx::query(
                r#"
                INSERT INTO order_items (order_id, meal_id, meal_name, quantity, unit_price, total_price)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, order_id, meal_id, meal_name, quantity, unit_price, total_price, created_at
                "#,
            )
            .bind(order_id.as_i64())
            .bind(item.meal_id.as_i64())
            .bind(&item.meal_name)
            .bind(i64::from(item.quantity))
            .bind(item.unit_price)
            .bind(item.total_price)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_order_item", e))?;

            items.push(order_item_from_row(&item_row)?);
        }

        // Drain the cart inside the same transaction: either the order exists
        // and the cart is empty, or neither happened.
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(order.cart_id.as_i64())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_order_drain_cart", e))?;

        let stored = order_from_row(&row, items)?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_order", e))?;

        Ok(stored)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let order_id = OrderId::from_i64(
                row.try_get("id")
                    .map_err(|e| map_sqlx_error("list_orders", e))?,
            );
            let items = self.load_items(order_id).await?;
            orders.push(order_from_row(row, items)?);
        }
        Ok(orders)
    }

    async fn get_by_user_and_id(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, StoreError> {
        let Some(row) = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(order_id.as_i64())
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_order", e))?
        else {
            return Ok(None);
        };

        let items = self.load_items(order_id).await?;
        Ok(Some(order_from_row(&row, items)?))
    }

    async fn delete_one(&self, user_id: UserId, order_id: OrderId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND user_id = $2")
            .bind(order_id.as_i64())
            .bind(user_id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self, user_id: UserId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE user_id = $1")
            .bind(user_id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_orders", e))?;

        Ok(result.rows_affected())
    }
}

/// Postgres-backed `MealLookup` over the catalog service's `meals` table.
pub struct PostgresMealLookup {
    pool: PgPool,
}

impl PostgresMealLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MealLookup for PostgresMealLookup {
    async fn get(&self, meal_id: MealId) -> Result<Option<MealSnapshot>, CatalogError> {
        let row = sqlx::query("SELECT id, name, unit_price FROM meals WHERE id = $1")
            .bind(meal_id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let decode = |e: sqlx::Error| CatalogError::Unavailable(e.to_string());
        Ok(Some(MealSnapshot {
            id: MealId::from_i64(row.try_get("id").map_err(decode)?),
            name: row.try_get("name").map_err(decode)?,
            unit_price: row.try_get("unit_price").map_err(decode)?,
        }))
    }
}
