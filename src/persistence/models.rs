//! Database models for events and snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored event row from the `events` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Auto-increment row ID.
    pub id: i64,
    /// Order the event is scoped to, if any.
    pub order_id: Option<Uuid>,
    /// Driver the event is scoped to, if any.
    pub driver_id: Option<Uuid>,
    /// Event type discriminator (e.g. `"bid_resolved"`).
    pub event_type: String,
    /// JSONB payload with event-specific data.
    pub payload: serde_json::Value,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// An order snapshot row from the `order_snapshots` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshotRow {
    /// Auto-increment row ID.
    pub id: i64,
    /// Order that was snapshotted.
    pub order_id: Uuid,
    /// Order status string at snapshot time.
    pub status: String,
    /// Full order entry state (order, items, bids, messages) as JSONB.
    pub state_json: serde_json::Value,
    /// Entry mutation counter at snapshot time.
    pub version: i64,
    /// Snapshot timestamp.
    pub snapshot_at: DateTime<Utc>,
}
