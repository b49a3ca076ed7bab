//! `mokka-cart` — cart domain types and invariants.
//!
//! Pure domain logic: no IO, no HTTP, no storage.

pub mod cart;

pub use cart::{line_total, Cart, CartItem, CartItemPatch, NewCartItem};
