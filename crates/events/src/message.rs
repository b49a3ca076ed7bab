use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Envelope for a published event: transport metadata plus the JSON payload.
///
/// This is the unit that travels over the bus. Consumers route on `topic` and
/// deserialize `payload` into the typed event for that topic.
///
/// Notes:
/// - `event_id` is a UUIDv7 assigned at publish time (time-ordered, useful
///   for correlating redeliveries in logs).
/// - `published_at` is transport time, not business time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    event_id: Uuid,
    topic: String,
    published_at: DateTime<Utc>,
    payload: JsonValue,
}

impl EventMessage {
    pub fn new(topic: impl Into<String>, payload: JsonValue) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            topic: topic.into(),
            published_at: Utc::now(),
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn payload(&self) -> &JsonValue {
        &self.payload
    }

    pub fn into_payload(self) -> JsonValue {
        self.payload
    }
}
