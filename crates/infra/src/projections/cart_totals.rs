//! Applies `CartTotalChanged` events to the cached `cart.total_price`.

use thiserror::Error;

use mokka_core::UserId;
use mokka_events::{CartTotalChanged, EventMessage, Subscription};

use crate::error::StoreError;
use crate::stores::CartStore;

#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The target cart does not exist (yet); re-raised so the broker can
    /// redeliver once provisioning has caught up.
    #[error("cart for user with id={0} was not found")]
    CartNotFound(UserId),

    #[error("malformed event payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Consumer group the totals projector subscribes under.
pub const CART_TOTALS_GROUP: &str = "cart-update-service";

/// Projector for the `cart-updated` topic.
///
/// The write is an unconditional last-write-wins update of the absolute
/// total, which makes redelivery of the same event a no-op. In-order
/// delivery per user is assumed from the broker, not enforced here.
pub struct CartTotalsProjection<S> {
    carts: S,
}

impl<S> CartTotalsProjection<S>
where
    S: CartStore,
{
    pub fn new(carts: S) -> Self {
        Self { carts }
    }

    /// Apply one message from the `cart-updated` topic.
    pub async fn apply(&self, message: &EventMessage) -> Result<(), ProjectionError> {
        let event: CartTotalChanged = serde_json::from_value(message.payload().clone())?;
        let user_id = event.user_id;
        let total_price = event.total_price();

        tracing::info!(%user_id, %total_price, "applying cart total");

        match self.carts.set_total_by_user(user_id, total_price).await? {
            Some(cart) => {
                tracing::debug!(cart_id = %cart.id, %total_price, "cart total applied");
                Ok(())
            }
            None => Err(ProjectionError::CartNotFound(user_id)),
        }
    }

    /// Long-lived consumer loop; runs until the bus goes away.
    pub async fn run(&self, mut subscription: Subscription<EventMessage>) {
        while let Some(message) = subscription.recv().await {
            if let Err(error) = self.apply(&message).await {
                tracing::error!(
                    %error,
                    event_id = %message.event_id(),
                    "failed to apply cart total event"
                );
            }
        }
    }
}
