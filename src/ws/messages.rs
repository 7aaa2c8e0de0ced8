//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to events for specific orders and/or drivers.
    Subscribe {
        /// Order IDs to subscribe to. Use `["*"]` for all orders.
        #[serde(default)]
        order_ids: Vec<String>,
        /// Driver IDs to subscribe to, for presence events.
        #[serde(default)]
        driver_ids: Vec<String>,
    },
    /// Unsubscribe from events for specific orders and/or drivers.
    Unsubscribe {
        /// Order IDs to unsubscribe from.
        #[serde(default)]
        order_ids: Vec<String>,
        /// Driver IDs to unsubscribe from.
        #[serde(default)]
        driver_ids: Vec<String>,
    },
    /// Fetch a full order snapshot, for joining a tracking session late
    /// or resyncing after a dropped connection.
    Snapshot {
        /// Target order ID.
        order_id: String,
    },
}
