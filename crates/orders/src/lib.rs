//! `mokka-orders` — order domain types.
//!
//! Orders are immutable point-in-time conversions of a cart; nothing in this
//! crate touches IO or live catalog data.

pub mod order;

pub use order::{
    DeliveryDetails, NewOrder, NewOrderItem, Order, OrderDraft, OrderItem, OrderStatus,
    PaymentMethod, PaymentStatus,
};
