//! Order-scoped chat messages.
//!
//! A message thread is an append-only log: content is immutable once
//! persisted and only the read flag may flip, false to true. The per-order
//! `seq` gives every reader the same total order over the thread.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ActorId, MessageId, OrderId};

/// A single chat message between the order's customer and driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// The order this message belongs to.
    pub order_id: OrderId,
    /// The participant who wrote the message.
    pub sender_id: ActorId,
    /// Message body; immutable after creation.
    pub content: String,
    /// Whether the counterpart has read the message.
    pub is_read: bool,
    /// Strictly increasing position within the order's thread.
    pub seq: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Creates an unread message at the given thread position.
    #[must_use]
    pub fn new(order_id: OrderId, sender_id: ActorId, content: String, seq: u64) -> Self {
        Self {
            id: MessageId::new(),
            order_id,
            sender_id,
            content,
            is_read: false,
            seq,
            created_at: Utc::now(),
        }
    }
}
