//! Typed publish front-end over the raw bus.

use serde::Serialize;
use thiserror::Error;

use crate::bus::{BusError, EventBus};
use crate::event::Event;
use crate::message::EventMessage;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize event payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Serializes typed events into `EventMessage` envelopes and publishes them.
///
/// Constructed once at wiring time and handed to every service that produces
/// events; holds the bus by whatever handle the caller chose (typically
/// `Arc<dyn EventBus>`).
#[derive(Clone)]
pub struct EventPublisher<B> {
    bus: B,
}

impl<B> EventPublisher<B>
where
    B: EventBus,
{
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn publish<E>(&self, event: &E) -> Result<(), PublishError>
    where
        E: Event + Serialize,
    {
        let payload = serde_json::to_value(event)?;
        let message = EventMessage::new(event.topic(), payload);

        tracing::debug!(
            topic = event.topic(),
            event_type = event.event_type(),
            event_id = %message.event_id(),
            "publishing event"
        );
        self.bus.publish(message)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal_macros::dec;

    use mokka_core::UserId;

    use super::*;
    use crate::cart::CartTotalChanged;
    use crate::in_memory_bus::InMemoryEventBus;
    use crate::topics::TOPIC_CART_UPDATED;

    #[tokio::test]
    async fn published_event_round_trips_through_the_bus() {
        let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new());
        let mut sub = bus.subscribe(TOPIC_CART_UPDATED, "test-group");

        let publisher = EventPublisher::new(bus);
        publisher
            .publish(&CartTotalChanged::new(UserId::from_i64(1), dec!(10.00)))
            .unwrap();

        let message = sub.recv().await.unwrap();
        assert_eq!(message.topic(), TOPIC_CART_UPDATED);

        let event: CartTotalChanged = serde_json::from_value(message.into_payload()).unwrap();
        assert_eq!(event.user_id, UserId::from_i64(1));
        assert_eq!(event.total_price(), dec!(10.00));
    }
}
