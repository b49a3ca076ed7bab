use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use mokka_cart::{Cart, CartItem};
use mokka_core::{CartId, DomainError, DomainResult, MealId, OrderId, OrderItemId, UserId};

/// Fulfillment status lifecycle.
///
/// Transitions past `Pending` belong to an external fulfillment process; this
/// backend only ever writes the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Payme,
    Click,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::validation(format!("unknown order status: {other}"))),
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl core::str::FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(DomainError::validation(format!(
                "unknown payment status: {other}"
            ))),
        }
    }
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Payme => "payme",
            Self::Click => "click",
        }
    }
}

impl core::str::FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "payme" => Ok(Self::Payme),
            "click" => Ok(Self::Click),
            other => Err(DomainError::validation(format!(
                "unknown payment method: {other}"
            ))),
        }
    }
}

/// Where and how to deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub delivery_address: String,
    pub delivery_latitude: Decimal,
    pub delivery_longitude: Decimal,
    pub house_number: String,
    pub entrance_number: Option<String>,
    pub level: Option<String>,
    pub apartment_number: Option<String>,
    pub delivery_notes: Option<String>,
    pub phone_number: Option<String>,
}

/// Caller-supplied input for placing an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub delivery: DeliveryDetails,
    pub payment_method: PaymentMethod,
    pub scheduled_time: Option<DateTime<Utc>>,
}

/// An immutable, placed order.
///
/// `total_price` and the item rows are frozen at placement time; nothing here
/// is ever recomputed from live cart or catalog data. `cart_id` is a
/// historical reference, not a live foreign key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub cart_id: CartId,
    #[serde(flatten)]
    pub delivery: DeliveryDetails,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// Point-in-time copy of one cart line.
///
/// `meal_id` is optional because the meal may be deleted from the catalog
/// long after the order was placed; the snapshot fields stand on their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub meal_id: Option<MealId>,
    pub meal_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// An order ready for insertion (ids assigned by the store).
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub cart_id: CartId,
    pub delivery: DeliveryDetails,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub meal_id: MealId,
    pub meal_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl NewOrder {
    /// Snapshot a cart and its items into an order.
    ///
    /// The order total is the cart's **cached** total (whatever the projector
    /// has applied so far), and each line is copied verbatim. An empty cart
    /// cannot be ordered.
    pub fn from_cart(cart: &Cart, items: &[CartItem], draft: OrderDraft) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::invariant(
                "cannot place an order from an empty cart",
            ));
        }

        let items = items
            .iter()
            .map(|item| NewOrderItem {
                meal_id: item.meal_id,
                meal_name: item.meal_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                total_price: item.total_price,
            })
            .collect();

        Ok(Self {
            user_id: cart.user_id,
            cart_id: cart.id,
            delivery: draft.delivery,
            total_price: cart.total_price,
            status: OrderStatus::default(),
            payment_status: PaymentStatus::default(),
            payment_method: draft.payment_method,
            scheduled_time: draft.scheduled_time,
            items,
        })
    }
}
