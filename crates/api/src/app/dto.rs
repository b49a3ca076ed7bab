//! Request DTOs and JSON mapping helpers.
//!
//! Responses serialize the domain types directly; only requests need their
//! own shapes (wider integer types so out-of-range values become 400s
//! instead of deserialization failures).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use mokka_orders::{DeliveryDetails, OrderDraft, PaymentMethod};

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub meal_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub delivery_address: String,
    pub delivery_latitude: Decimal,
    pub delivery_longitude: Decimal,
    pub house_number: String,
    pub entrance_number: Option<String>,
    pub level: Option<String>,
    pub apartment_number: Option<String>,
    pub delivery_notes: Option<String>,
    pub phone_number: Option<String>,
    pub payment_method: PaymentMethod,
    pub scheduled_time: Option<DateTime<Utc>>,
}

impl CreateOrderRequest {
    pub fn into_draft(self) -> OrderDraft {
        OrderDraft {
            delivery: DeliveryDetails {
                delivery_address: self.delivery_address,
                delivery_latitude: self.delivery_latitude,
                delivery_longitude: self.delivery_longitude,
                house_number: self.house_number,
                entrance_number: self.entrance_number,
                level: self.level,
                apartment_number: self.apartment_number,
                delivery_notes: self.delivery_notes,
                phone_number: self.phone_number,
            },
            payment_method: self.payment_method,
            scheduled_time: self.scheduled_time,
        }
    }
}
