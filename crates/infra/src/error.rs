//! Infrastructure and service error model.

use thiserror::Error;

use mokka_catalog::CatalogError;
use mokka_core::{CartItemId, DomainError, MealId, OrderId, UserId};
use mokka_events::PublishError;

/// Storage-layer failure (connection, SQL, row decoding, lock poisoning).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store operation '{operation}' failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },

    /// Internal lock poisoned (in-memory stores only).
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn backend(operation: &'static str, error: impl core::fmt::Display) -> Self {
        Self::Backend {
            operation,
            message: error.to_string(),
        }
    }
}

/// Typed failure of a cart/order service operation.
///
/// The HTTP layer maps these onto status codes (404/409/400); the messages are
/// the human-readable detail surfaced to callers.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("cart for user with id={0} was not found")]
    CartNotFound(UserId),

    #[error("cart for user with id={0} already exists")]
    CartAlreadyExists(UserId),

    #[error("cart item with id={0} was not found")]
    CartItemNotFound(CartItemId),

    #[error("cart items for user with id={0} were not found")]
    CartItemsNotFound(UserId),

    #[error("meal with id={0} was not found")]
    MealNotFound(MealId),

    #[error("order with id={1} was not found for user with id={0}")]
    OrderNotFound(UserId, OrderId),

    #[error("orders for user with id={0} were not found")]
    OrdersNotFound(UserId),

    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    #[error("no update data provided")]
    NoUpdateData,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}
