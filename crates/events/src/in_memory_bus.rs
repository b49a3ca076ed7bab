//! In-memory event bus for dev/tests.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc::{self, UnboundedSender};

use crate::bus::{BusError, EventBus, Subscription};
use crate::message::EventMessage;

#[derive(Debug, Default)]
struct Group {
    senders: Vec<UnboundedSender<EventMessage>>,
    /// Round-robin cursor for within-group delivery.
    next: usize,
}

/// In-memory pub/sub bus.
///
/// - No IO; channels only
/// - Per-topic FIFO as seen by a single subscriber
/// - One delivery per consumer group, round-robin within the group
/// - Messages published to a topic nobody subscribed to are dropped
#[derive(Debug, Default)]
pub struct InMemoryEventBus {
    topics: Mutex<HashMap<String, HashMap<String, Group>>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(&self, message: EventMessage) -> Result<(), BusError> {
        let mut topics = self.topics.lock().map_err(|_| BusError::Poisoned)?;

        let Some(groups) = topics.get_mut(message.topic()) else {
            return Ok(());
        };

        for group in groups.values_mut() {
            // Drop dead subscribers while publishing.
            group.senders.retain(|tx| !tx.is_closed());
            if group.senders.is_empty() {
                continue;
            }

            let idx = group.next % group.senders.len();
            group.next = group.next.wrapping_add(1);
            let _ = group.senders[idx].send(message.clone());
        }

        Ok(())
    }

    fn subscribe(&self, topic: &str, group: &str) -> Subscription<EventMessage> {
        let (tx, rx) = mpsc::unbounded_channel();

        // If the lock is poisoned, we still return a subscription;
        // it just won't receive messages until the process restarts.
        if let Ok(mut topics) = self.topics.lock() {
            topics
                .entry(topic.to_string())
                .or_default()
                .entry(group.to_string())
                .or_default()
                .senders
                .push(tx);
        }

        Subscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(n: i64) -> EventMessage {
        EventMessage::new("orders-test", json!({ "n": n }))
    }

    #[tokio::test]
    async fn every_group_receives_its_own_copy() {
        let bus = InMemoryEventBus::new();
        let mut a = bus.subscribe("orders-test", "group-a");
        let mut b = bus.subscribe("orders-test", "group-b");

        bus.publish(message(1)).unwrap();

        assert_eq!(a.recv().await.unwrap().payload()["n"], 1);
        assert_eq!(b.recv().await.unwrap().payload()["n"], 1);
    }

    #[tokio::test]
    async fn within_a_group_each_message_is_delivered_once() {
        let bus = InMemoryEventBus::new();
        let mut first = bus.subscribe("orders-test", "group-a");
        let mut second = bus.subscribe("orders-test", "group-a");

        bus.publish(message(1)).unwrap();
        bus.publish(message(2)).unwrap();

        // Round-robin: one message each, no duplicates.
        let got_first = first.recv().await.unwrap();
        let got_second = second.recv().await.unwrap();
        let mut ns = vec![
            got_first.payload()["n"].as_i64().unwrap(),
            got_second.payload()["n"].as_i64().unwrap(),
        ];
        ns.sort_unstable();
        assert_eq!(ns, vec![1, 2]);

        assert!(first.try_recv().is_err());
        assert!(second.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_dropped() {
        let bus = InMemoryEventBus::new();
        bus.publish(message(1)).unwrap();

        let mut late = bus.subscribe("orders-test", "group-a");
        assert!(late.try_recv().is_err());
    }

    #[tokio::test]
    async fn dead_subscribers_are_pruned() {
        let bus = InMemoryEventBus::new();
        let first = bus.subscribe("orders-test", "group-a");
        let mut second = bus.subscribe("orders-test", "group-a");
        drop(first);

        bus.publish(message(1)).unwrap();
        bus.publish(message(2)).unwrap();

        assert_eq!(second.recv().await.unwrap().payload()["n"], 1);
        assert_eq!(second.recv().await.unwrap().payload()["n"], 2);
    }
}
