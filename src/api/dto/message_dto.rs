//! Chat-related DTOs for posting, listing, and read receipts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Message, MessageId};

/// Request body for `POST /orders/{id}/messages`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PostMessageRequest {
    /// The posting participant (customer or assigned driver).
    pub sender_id: uuid::Uuid,
    /// Message body.
    pub content: String,
}

/// Request body for `POST /orders/{id}/messages/{message_id}/read`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkReadRequest {
    /// The reading participant; must not be the sender.
    pub reader_id: uuid::Uuid,
}

/// A single message as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageDto {
    /// Message identifier.
    #[schema(value_type = uuid::Uuid)]
    pub message_id: MessageId,
    /// Message author.
    pub sender_id: uuid::Uuid,
    /// Message body.
    pub content: String,
    /// Whether the counterpart has read the message.
    pub is_read: bool,
    /// Position within the order's thread.
    pub seq: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageDto {
    fn from(message: Message) -> Self {
        Self {
            message_id: message.id,
            sender_id: *message.sender_id.as_uuid(),
            content: message.content,
            is_read: message.is_read,
            seq: message.seq,
            created_at: message.created_at,
        }
    }
}

/// Response body for `GET /orders/{id}/messages`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageListResponse {
    /// Thread in creation (seq) order.
    pub data: Vec<MessageDto>,
}
