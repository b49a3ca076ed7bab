//! Cart lifecycle: provisioning, lookup, teardown.

use mokka_cart::Cart;
use mokka_core::UserId;

use crate::error::ServiceError;
use crate::stores::{CartItemStore, CartStore};

/// Thin CRUD over the cart aggregate row.
///
/// Used by the provisioning projector (create) and the cart HTTP routes.
pub struct CartService<S, I> {
    carts: S,
    items: I,
}

impl<S, I> CartService<S, I>
where
    S: CartStore,
    I: CartItemStore,
{
    pub fn new(carts: S, items: I) -> Self {
        Self { carts, items }
    }

    pub async fn create(&self, user_id: UserId) -> Result<Cart, ServiceError> {
        match self.carts.create(user_id).await? {
            Some(cart) => {
                tracing::info!(%user_id, cart_id = %cart.id, "cart created");
                Ok(cart)
            }
            None => {
                tracing::warn!(%user_id, "cart already exists");
                Err(ServiceError::CartAlreadyExists(user_id))
            }
        }
    }

    pub async fn get_by_user(&self, user_id: UserId) -> Result<Cart, ServiceError> {
        match self.carts.get_by_user(user_id).await? {
            Some(cart) => Ok(cart),
            None => {
                tracing::warn!(%user_id, "cart was not found");
                Err(ServiceError::CartNotFound(user_id))
            }
        }
    }

    /// Delete the user's cart along with its line items.
    pub async fn delete_by_user(&self, user_id: UserId) -> Result<(), ServiceError> {
        let cart = self.get_by_user(user_id).await?;

        self.items.delete_all_by_cart(cart.id).await?;
        if !self.carts.delete_by_user(user_id).await? {
            return Err(ServiceError::CartNotFound(user_id));
        }

        tracing::info!(%user_id, cart_id = %cart.id, "cart deleted");
        Ok(())
    }
}
