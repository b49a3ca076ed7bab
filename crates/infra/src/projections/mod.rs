//! Event consumers that keep the cart aggregate in sync.
//!
//! Projectors are decoupled from the HTTP request path: they subscribe to a
//! topic under a fixed consumer group and apply payloads to the cart store
//! from a long-lived task. Failed applications are logged and re-raised to
//! the consumer loop; redelivery is the broker's job (there is no dead-letter
//! queue here).

pub mod cart_provisioning;
pub mod cart_totals;

pub use cart_provisioning::{CartProvisioningProjection, CART_PROVISIONING_GROUP};
pub use cart_totals::{CartTotalsProjection, CART_TOTALS_GROUP};
