//! `mokka-infra` — stores, application services and event projectors.
//!
//! Everything stateful lives here: the cart/order stores (in-memory and
//! Postgres), the services the HTTP layer calls, and the projectors that
//! apply bus events back onto the cart aggregate.

pub mod error;
pub mod projections;
pub mod services;
pub mod stores;

pub use error::{ServiceError, StoreError};
pub use projections::{
    CartProvisioningProjection, CartTotalsProjection, CART_PROVISIONING_GROUP, CART_TOTALS_GROUP,
};
pub use services::{CartItemLedger, CartService, OrderAssembler, UpdateOutcome};
pub use stores::{CartItemStore, CartStore, OrderStore};
