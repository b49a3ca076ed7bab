//! Provisions an empty cart when a `UserCreated` event arrives.

use thiserror::Error;

use mokka_core::UserId;
use mokka_events::{EventMessage, Subscription, UserCreated};

use crate::error::StoreError;
use crate::stores::CartStore;

/// Consumer group the provisioning projector subscribes under.
pub const CART_PROVISIONING_GROUP: &str = "cart-create-service";

#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// Registration is expected to emit `UserCreated` exactly once per user,
    /// so a duplicate is a real fault and is re-raised, not swallowed.
    #[error("cart for user with id={0} already exists")]
    CartAlreadyExists(UserId),

    #[error("malformed event payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Projector for the `user-created` topic.
pub struct CartProvisioningProjection<S> {
    carts: S,
}

impl<S> CartProvisioningProjection<S>
where
    S: CartStore,
{
    pub fn new(carts: S) -> Self {
        Self { carts }
    }

    /// Apply one message from the `user-created` topic.
    pub async fn apply(&self, message: &EventMessage) -> Result<(), ProvisioningError> {
        let event: UserCreated = serde_json::from_value(message.payload().clone())?;
        let user_id = event.user_id;

        tracing::info!(%user_id, "provisioning cart for new user");

        match self.carts.create(user_id).await? {
            Some(cart) => {
                tracing::info!(%user_id, cart_id = %cart.id, "cart provisioned");
                Ok(())
            }
            None => Err(ProvisioningError::CartAlreadyExists(user_id)),
        }
    }

    /// Long-lived consumer loop; runs until the bus goes away.
    pub async fn run(&self, mut subscription: Subscription<EventMessage>) {
        while let Some(message) = subscription.recv().await {
            if let Err(error) = self.apply(&message).await {
                tracing::error!(
                    %error,
                    event_id = %message.event_id(),
                    "failed to provision cart"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use serde_json::json;

    use mokka_events::TOPIC_USER_CREATED;

    use super::*;
    use crate::stores::{CartStore as _, InMemoryCartStore};

    fn message(user_id: i64) -> EventMessage {
        EventMessage::new(TOPIC_USER_CREATED, json!({ "user_id": user_id }))
    }

    #[tokio::test]
    async fn creates_an_empty_cart_for_the_new_user() {
        let carts = Arc::new(InMemoryCartStore::new());
        let projection = CartProvisioningProjection::new(carts.clone());

        projection.apply(&message(5)).await.unwrap();

        let cart = carts
            .get_by_user(UserId::from_i64(5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cart.total_price, Decimal::ZERO);
    }

    #[tokio::test]
    async fn duplicate_user_created_is_re_raised() {
        let carts = Arc::new(InMemoryCartStore::new());
        let projection = CartProvisioningProjection::new(carts.clone());

        projection.apply(&message(5)).await.unwrap();
        let err = projection.apply(&message(5)).await.unwrap_err();
        assert!(
            matches!(err, ProvisioningError::CartAlreadyExists(u) if u == UserId::from_i64(5))
        );
    }

    #[tokio::test]
    async fn identity_payload_is_tolerated() {
        let carts = Arc::new(InMemoryCartStore::new());
        let projection = CartProvisioningProjection::new(carts.clone());

        let message = EventMessage::new(
            TOPIC_USER_CREATED,
            json!({ "user_id": 6, "identity_data": { "email": "user@example.com" } }),
        );
        projection.apply(&message).await.unwrap();

        assert!(
            carts
                .get_by_user(UserId::from_i64(6))
                .await
                .unwrap()
                .is_some()
        );
    }
}
