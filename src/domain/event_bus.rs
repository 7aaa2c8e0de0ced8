//! Broadcast channel for domain events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Every state
//! mutation publishes a [`DeliveryEvent`] through the bus, and every
//! tracking session subscribes to receive filtered events.
//!
//! Publishing happens inside the mutated entity's critical section, so for
//! any single subscriber, events about the same order arrive in the order
//! they were produced. Delivery is at-least-once from the subscriber's
//! point of view; lagging receivers lose the oldest events and must
//! recover via a snapshot rather than the stream.

use tokio::sync::broadcast;

use super::DeliveryEvent;

/// Broadcast bus for [`DeliveryEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity
/// (default 10 000). When the ring buffer is full, the oldest events are
/// dropped for lagging receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DeliveryEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event. If there
    /// are no active receivers, the event is silently dropped; a delivery
    /// failure to one subscriber never fails the triggering write.
    pub fn publish(&self, event: DeliveryEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future events.
    ///
    /// Each tracking session calls this once on connect; dropping the
    /// receiver is the unsubscribe.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeliveryEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{ActorId, OrderId};
    use chrono::Utc;

    fn make_event(order_id: OrderId) -> DeliveryEvent {
        DeliveryEvent::OrderCreated {
            order_id,
            customer_id: ActorId::new(),
            store_id: uuid::Uuid::new_v4(),
            total: 35_000,
            version: 1,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(100);
        let count = bus.publish(make_event(OrderId::new()));
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn subscriber_receives_event() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        let id = OrderId::new();
        bus.publish(make_event(id));

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected to receive event");
        };
        assert_eq!(event.order_id(), Some(id));
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(100);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let id = OrderId::new();
        let count = bus.publish(make_event(id));
        assert_eq!(count, 2);

        let e1 = rx1.recv().await;
        let e2 = rx2.recv().await;
        let Ok(e1) = e1 else {
            panic!("rx1 failed");
        };
        let Ok(e2) = e2 else {
            panic!("rx2 failed");
        };
        assert_eq!(e1.order_id(), e2.order_id());
    }

    #[tokio::test]
    async fn events_for_one_order_arrive_in_publish_order() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        let id = OrderId::new();
        for _ in 0..5 {
            bus.publish(make_event(id));
        }

        let mut seen = 0;
        while seen < 5 {
            let Ok(event) = rx.recv().await else {
                panic!("stream ended early");
            };
            assert_eq!(event.order_id(), Some(id));
            seen += 1;
        }
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = EventBus::new(100);
        assert_eq!(bus.receiver_count(), 0);

        let _rx1 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        drop(_rx1);
        assert_eq!(bus.receiver_count(), 1);
    }
}
