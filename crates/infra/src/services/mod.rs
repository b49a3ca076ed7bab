//! Application services: cart CRUD, the cart-item ledger and order assembly.
//!
//! Services are generic over the store/bus handles they are given; wiring
//! constructs them once at process start with `Arc<dyn …>` handles.

pub mod cart;
pub mod cart_items;
pub mod orders;

pub use cart::CartService;
pub use cart_items::{CartItemLedger, UpdateOutcome};
pub use orders::OrderAssembler;
