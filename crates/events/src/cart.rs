//! Cart integration events.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use mokka_core::UserId;

use crate::event::Event;
use crate::topics::TOPIC_CART_UPDATED;

/// The slice of cart state the totals projector writes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartTotalPatch {
    pub total_price: Decimal,
}

/// Published after every line-item mutation.
///
/// Carries the **absolute** new cart total, not a delta, so applying it is
/// idempotent under redelivery (last write wins). Wire shape:
/// `{"user_id": 1, "cart_data": {"total_price": "25.00"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartTotalChanged {
    pub user_id: UserId,
    pub cart_data: CartTotalPatch,
}

impl CartTotalChanged {
    pub fn new(user_id: UserId, total_price: Decimal) -> Self {
        Self {
            user_id,
            cart_data: CartTotalPatch { total_price },
        }
    }

    pub fn total_price(&self) -> Decimal {
        self.cart_data.total_price
    }
}

impl Event for CartTotalChanged {
    fn topic(&self) -> &'static str {
        TOPIC_CART_UPDATED
    }

    fn event_type(&self) -> &'static str {
        "cart.total_changed"
    }
}
