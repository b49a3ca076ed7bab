//! `mokka-events` — integration events and the bus they travel on.
//!
//! Producers publish typed events through [`EventPublisher`]; projectors
//! subscribe per topic + consumer group and apply payloads to their stores.

pub mod bus;
pub mod cart;
pub mod event;
pub mod in_memory_bus;
pub mod message;
pub mod publisher;
pub mod topics;
pub mod user;

pub use bus::{BusError, EventBus, Subscription};
pub use cart::{CartTotalChanged, CartTotalPatch};
pub use event::Event;
pub use in_memory_bus::InMemoryEventBus;
pub use message::EventMessage;
pub use publisher::{EventPublisher, PublishError};
pub use topics::{TOPIC_CART_UPDATED, TOPIC_USER_CREATED};
pub use user::UserCreated;
