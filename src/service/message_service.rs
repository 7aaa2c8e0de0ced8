//! Message service: the order-scoped chat thread.
//!
//! Messages append under the per-order write lock, which is what makes
//! the per-order sequence numbers strictly increasing and gives every
//! reader the same total order regardless of which participant posted
//! concurrently.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    ActorId, DeliveryEvent, EventBus, Message, MessageId, OrderId, OrderRegistry,
};
use crate::error::GatewayError;

/// Orchestration layer for posting, reading, and listing chat messages.
#[derive(Debug, Clone)]
pub struct MessageService {
    registry: Arc<OrderRegistry>,
    event_bus: EventBus,
}

impl MessageService {
    /// Creates a new `MessageService`.
    #[must_use]
    pub fn new(registry: Arc<OrderRegistry>, event_bus: EventBus) -> Self {
        Self {
            registry,
            event_bus,
        }
    }

    /// Appends a message to the order's thread and fans it out to both
    /// participants.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::OrderNotActive`] when no driver is assigned yet
    ///   (chat requires a counterpart).
    /// - [`GatewayError::Unauthorized`] unless the sender is the order's
    ///   customer or assigned driver.
    /// - [`GatewayError::InvalidRequest`] for an empty message body.
    pub async fn post_message(
        &self,
        order_id: OrderId,
        sender_id: ActorId,
        content: String,
    ) -> Result<Message, GatewayError> {
        if content.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "message content must not be empty".to_string(),
            ));
        }

        let entry_lock = self.registry.get(order_id).await?;
        let mut entry = entry_lock.write().await;

        let Some(driver_id) = entry.order.driver_id else {
            return Err(GatewayError::OrderNotActive);
        };
        if sender_id != entry.order.customer_id && sender_id != driver_id {
            return Err(GatewayError::Unauthorized {
                actor: *sender_id.as_uuid(),
                action: format!("post to order {order_id}"),
            });
        }

        let seq = entry.next_message_seq;
        entry.next_message_seq = entry.next_message_seq.saturating_add(1);
        let message = Message::new(order_id, sender_id, content, seq);
        entry.messages.push(message.clone());
        let version = entry.touch();

        let _ = self.event_bus.publish(DeliveryEvent::MessagePosted {
            order_id,
            message_id: message.id,
            sender_id,
            seq,
            content: message.content.clone(),
            version,
            timestamp: message.created_at,
        });
        drop(entry);

        Ok(message)
    }

    /// Marks a message as read by the counterpart. Idempotent: marking an
    /// already-read message succeeds without emitting a second event.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::MessageNotFound`] for an unknown message id.
    /// - [`GatewayError::Unauthorized`] when the reader is the original
    ///   sender or not an order participant.
    pub async fn mark_read(
        &self,
        order_id: OrderId,
        message_id: MessageId,
        reader_id: ActorId,
    ) -> Result<(), GatewayError> {
        let entry_lock = self.registry.get(order_id).await?;
        let mut entry = entry_lock.write().await;

        let is_participant = reader_id == entry.order.customer_id
            || entry.order.driver_id == Some(reader_id);
        if !is_participant {
            return Err(GatewayError::Unauthorized {
                actor: *reader_id.as_uuid(),
                action: format!("read messages of order {order_id}"),
            });
        }

        let message = entry
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or(GatewayError::MessageNotFound(*message_id.as_uuid()))?;
        if message.sender_id == reader_id {
            return Err(GatewayError::Unauthorized {
                actor: *reader_id.as_uuid(),
                action: "mark own message as read".to_string(),
            });
        }
        if message.is_read {
            return Ok(());
        }
        message.is_read = true;
        let version = entry.touch();

        let _ = self.event_bus.publish(DeliveryEvent::MessageRead {
            order_id,
            message_id,
            reader_id,
            version,
            timestamp: Utc::now(),
        });
        drop(entry);

        Ok(())
    }

    /// Returns the order's thread in creation (seq) order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::OrderNotFound`] for an unknown id.
    pub async fn history(&self, order_id: OrderId) -> Result<Vec<Message>, GatewayError> {
        let entry_lock = self.registry.get(order_id).await?;
        let entry = entry_lock.read().await;
        Ok(entry.messages.clone())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::order::{Coordinates, NewOrderItem};
    use crate::domain::{OrderStatus, PresenceTracker};
    use crate::service::order_service::{CheckoutSpec, OrderService};
    use tokio_test::assert_ok;

    struct Fixture {
        orders: OrderService,
        messages: MessageService,
        customer: ActorId,
        driver: ActorId,
    }

    /// Creates an order already matched to a driver.
    async fn make_fixture() -> (Fixture, OrderId) {
        let registry = Arc::new(OrderRegistry::new());
        let bus = EventBus::new(1000);
        let orders = OrderService::new(
            Arc::clone(&registry),
            Arc::new(PresenceTracker::new()),
            bus.clone(),
        );
        let messages = MessageService::new(Arc::clone(&registry), bus);

        let customer = ActorId::new();
        let driver = ActorId::new();
        let spec = CheckoutSpec {
            customer_id: customer,
            store_id: uuid::Uuid::new_v4(),
            items: vec![NewOrderItem {
                product_id: uuid::Uuid::new_v4(),
                quantity: 1,
                unit_price: 10_000,
            }],
            delivery_address: "12 Rizal Ave".to_string(),
            delivery_coords: Coordinates {
                latitude: 14.5995,
                longitude: 120.9842,
            },
            notes: None,
            delivery_fee: 5_000,
        };
        let order = assert_ok!(orders.create_order(spec).await);
        {
            let entry_lock = assert_ok!(registry.get(order.id).await);
            let mut entry = entry_lock.write().await;
            entry.order.driver_id = Some(driver);
            let _ = assert_ok!(entry.transition(OrderStatus::Matched));
        }

        (
            Fixture {
                orders,
                messages,
                customer,
                driver,
            },
            order.id,
        )
    }

    #[tokio::test]
    async fn post_requires_assigned_driver() {
        let (fixture, _) = make_fixture().await;

        // A second, still-pending order has no counterpart to chat with.
        let spec = CheckoutSpec {
            customer_id: fixture.customer,
            store_id: uuid::Uuid::new_v4(),
            items: vec![NewOrderItem {
                product_id: uuid::Uuid::new_v4(),
                quantity: 1,
                unit_price: 10_000,
            }],
            delivery_address: "12 Rizal Ave".to_string(),
            delivery_coords: Coordinates {
                latitude: 14.5995,
                longitude: 120.9842,
            },
            notes: None,
            delivery_fee: 5_000,
        };
        let pending = assert_ok!(fixture.orders.create_order(spec).await);

        let result = fixture
            .messages
            .post_message(pending.id, fixture.customer, "hello?".to_string())
            .await;
        assert!(matches!(result, Err(GatewayError::OrderNotActive)));
    }

    #[tokio::test]
    async fn seq_increases_and_history_is_ordered() {
        let (fixture, order_id) = make_fixture().await;

        let m1 = assert_ok!(
            fixture
                .messages
                .post_message(order_id, fixture.customer, "please hurry".to_string())
                .await
        );
        let m2 = assert_ok!(
            fixture
                .messages
                .post_message(order_id, fixture.driver, "on my way".to_string())
                .await
        );
        assert_eq!(m1.seq, 1);
        assert_eq!(m2.seq, 2);

        let history = assert_ok!(fixture.messages.history(order_id).await);
        let seqs: Vec<u64> = history.iter().map(|m| m.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[tokio::test]
    async fn concurrent_posts_keep_total_order() {
        let (fixture, order_id) = make_fixture().await;

        let mut tasks = Vec::new();
        for i in 0..10u32 {
            let svc = fixture.messages.clone();
            let sender = if i % 2 == 0 {
                fixture.customer
            } else {
                fixture.driver
            };
            tasks.push(tokio::spawn(async move {
                svc.post_message(order_id, sender, format!("msg {i}")).await
            }));
        }
        for task in tasks {
            let Ok(result) = task.await else {
                panic!("post task panicked");
            };
            assert!(result.is_ok());
        }

        let history = assert_ok!(fixture.messages.history(order_id).await);
        assert_eq!(history.len(), 10);
        for window in history.windows(2) {
            let [a, b] = window else {
                panic!("bad window");
            };
            assert!(a.seq < b.seq);
        }
    }

    #[tokio::test]
    async fn outsider_cannot_post() {
        let (fixture, order_id) = make_fixture().await;
        let result = fixture
            .messages
            .post_message(order_id, ActorId::new(), "let me in".to_string())
            .await;
        assert!(matches!(result, Err(GatewayError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn mark_read_is_idempotent_and_sender_restricted() {
        let (fixture, order_id) = make_fixture().await;
        let msg = assert_ok!(
            fixture
                .messages
                .post_message(order_id, fixture.customer, "here yet?".to_string())
                .await
        );

        // Sender cannot mark its own message.
        let result = fixture
            .messages
            .mark_read(order_id, msg.id, fixture.customer)
            .await;
        assert!(matches!(result, Err(GatewayError::Unauthorized { .. })));

        // Counterpart can, repeatedly.
        let _ = assert_ok!(fixture.messages.mark_read(order_id, msg.id, fixture.driver).await);
        let _ = assert_ok!(fixture.messages.mark_read(order_id, msg.id, fixture.driver).await);

        let history = assert_ok!(fixture.messages.history(order_id).await);
        let Some(stored) = history.first() else {
            panic!("message missing");
        };
        assert!(stored.is_read);
    }

    #[tokio::test]
    async fn empty_content_is_invalid() {
        let (fixture, order_id) = make_fixture().await;
        let result = fixture
            .messages
            .post_message(order_id, fixture.customer, "   ".to_string())
            .await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }
}
