use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use mokka_core::{CartId, CartItemId, DomainError, DomainResult, MealId, UserId};

/// One user's in-progress cart.
///
/// `total_price` is a cached aggregate: it is written by the totals projector,
/// not by the request path, so it may briefly trail the line items. Once all
/// in-flight events are applied it equals the sum of the items' totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// A freshly provisioned, empty cart.
    pub fn new(id: CartId, user_id: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            total_price: Decimal::ZERO,
            created_at,
        }
    }
}

/// A line entry inside a cart.
///
/// `meal_name` and `unit_price` are snapshots frozen at add time; later
/// catalog changes never touch an existing line. Invariants: `quantity > 0`
/// and `total_price == quantity * unit_price` — a row that would violate
/// either must not exist (quantity 0 means removal, never a zero row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub meal_id: MealId,
    pub meal_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Line total for a quantity at a frozen unit price.
pub fn line_total(quantity: u32, unit_price: Decimal) -> Decimal {
    Decimal::from(quantity) * unit_price
}

/// A line item about to be inserted (id assigned by the store).
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub cart_id: CartId,
    pub meal_id: MealId,
    pub meal_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl NewCartItem {
    pub fn new(
        cart_id: CartId,
        meal_id: MealId,
        meal_name: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
    ) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be greater than zero"));
        }

        Ok(Self {
            cart_id,
            meal_id,
            meal_name: meal_name.into(),
            quantity,
            unit_price,
        })
    }

    pub fn total_price(&self) -> Decimal {
        line_total(self.quantity, self.unit_price)
    }
}

/// Partial update of a line item.
///
/// `quantity: Some(0)` is defined as removal, which the ledger handles before
/// any row is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartItemPatch {
    pub quantity: Option<u32>,
}

impl CartItemPatch {
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none()
    }
}
