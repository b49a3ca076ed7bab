//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus is intentionally **lightweight** and makes minimal assumptions:
//!
//! - **Transport-agnostic**: works with in-memory channels, Kafka, Redis
//!   streams, etc.
//! - **At-least-once delivery**: events may be redelivered; consumers must be
//!   idempotent.
//! - **Fire-and-forget publish**: there is no synchronous acknowledgement of
//!   consumer completion. A successful `publish()` means the transport
//!   accepted the message, nothing more.
//! - **No persistence**: the bus distributes, it does not store.
//!
//! Ordering is whatever the transport provides per topic; nothing here
//! enforces it.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, error::TryRecvError};

use crate::message::EventMessage;

/// Transport-level publish/subscribe failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The bus (or its internal registry) is no longer usable.
    #[error("event bus is closed")]
    Closed,

    /// Publish failed due to internal lock poisoning.
    #[error("event bus internal lock poisoned")]
    Poisoned,
}

/// A subscription to one topic within one consumer group.
///
/// Each subscription receives the messages routed to it by the bus; consume
/// with `recv().await` from a long-lived task. Dropping the subscription
/// unregisters it (the bus prunes dead receivers on publish).
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: UnboundedReceiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: UnboundedReceiver<M>) -> Self {
        Self { receiver }
    }

    /// Wait for the next message. Returns `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<M> {
        self.receiver.recv().await
    }

    /// Try to receive a message without waiting.
    pub fn try_recv(&mut self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }
}

/// Topic-based event bus (pub/sub abstraction).
///
/// Delivery semantics follow the broker model the projectors are written
/// against:
///
/// - every consumer **group** subscribed to a topic receives its own copy of
///   each message;
/// - within a group, each message is handed to exactly **one** subscriber.
///
/// Implementations must be safe to share across tasks; `publish()` is a plain
/// (non-async) call so producers on the request path never await the bus.
pub trait EventBus: Send + Sync {
    fn publish(&self, message: EventMessage) -> Result<(), BusError>;

    fn subscribe(&self, topic: &str, group: &str) -> Subscription<EventMessage>;
}

impl<B> EventBus for Arc<B>
where
    B: EventBus + ?Sized,
{
    fn publish(&self, message: EventMessage) -> Result<(), BusError> {
        (**self).publish(message)
    }

    fn subscribe(&self, topic: &str, group: &str) -> Subscription<EventMessage> {
        (**self).subscribe(topic, group)
    }
}
