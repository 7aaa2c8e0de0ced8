//! Order aggregate: status state machine, order row, and frozen line items.
//!
//! The canonical status field lives here. All mutation goes through the
//! service layer, which holds the per-order write lock while calling
//! [`OrderStatus::can_transition`] and applying side effects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::bid::DeliveryBid;
use super::ids::{ActorId, OrderId};
use super::message::Message;
use crate::error::GatewayError;

/// Delivery lifecycle status.
///
/// Forward chain: `Pending → Matched → Shopping → Delivering → Delivered`.
/// `Cancelled` is reachable from any non-terminal state. No transition may
/// skip a step in the forward chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Initial state at checkout; no driver assigned.
    Pending,
    /// A bid was accepted; driver assigned, delivery fee locked.
    Matched,
    /// The driver is collecting the items in the store.
    Shopping,
    /// The driver is en route to the delivery address.
    Delivering,
    /// Terminal: the order was handed over.
    Delivered,
    /// Terminal: the order was cancelled before completion.
    Cancelled,
}

impl OrderStatus {
    /// Returns `true` if this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Returns `true` if the order counts as actively held by a driver
    /// (drives the availability flag on the presence tracker).
    #[must_use]
    pub const fn is_active_assignment(self) -> bool {
        matches!(self, Self::Matched | Self::Shopping | Self::Delivering)
    }

    /// Returns `true` if `self → to` is an edge of the transition graph.
    #[must_use]
    pub const fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Matched)
                | (Self::Matched, Self::Shopping)
                | (Self::Shopping, Self::Delivering)
                | (Self::Delivering, Self::Delivered)
        ) || (matches!(to, Self::Cancelled) && !self.is_terminal())
    }

    /// Returns the status as a static string slice (snake_case).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Matched => "matched",
            Self::Shopping => "shopping",
            Self::Delivering => "delivering",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic coordinates of the delivery address.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// A customer's placed purchase, tracked through the delivery lifecycle.
///
/// All monetary amounts are integer minor currency units (cents).
/// Invariant: `total == subtotal + delivery_fee`, re-established by
/// [`Order::recompute_total`] on any fee change while still pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier (immutable after creation).
    pub id: OrderId,
    /// The customer who placed the order.
    pub customer_id: ActorId,
    /// The assigned driver; unset until a bid is accepted.
    pub driver_id: Option<ActorId>,
    /// The store the items are purchased from.
    pub store_id: uuid::Uuid,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Sum of all line subtotals, in cents.
    pub subtotal: u64,
    /// Delivery fee in cents; locked once the order is matched.
    pub delivery_fee: u64,
    /// `subtotal + delivery_fee`, in cents.
    pub total: u64,
    /// Free-form delivery address.
    pub delivery_address: String,
    /// Delivery destination coordinates.
    pub delivery_coords: Coordinates,
    /// Optional customer notes for the driver.
    pub notes: Option<String>,
    /// Creation timestamp (immutable).
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last mutation.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Re-establishes `total = subtotal + delivery_fee`.
    pub fn recompute_total(&mut self) {
        self.total = self.subtotal.saturating_add(self.delivery_fee);
    }
}

/// A single line of an order, denormalized from the catalog at purchase
/// time. Unit price and subtotal are frozen: later catalog price changes
/// never alter an existing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Catalog product id at time of purchase.
    pub product_id: uuid::Uuid,
    /// Quantity purchased.
    pub quantity: u32,
    /// Unit price in cents at time of purchase.
    pub unit_price: u64,
    /// `quantity * unit_price`, in cents.
    pub subtotal: u64,
}

/// Input line item supplied by the (external) cart at checkout.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewOrderItem {
    /// Catalog product id.
    #[schema(value_type = uuid::Uuid)]
    pub product_id: uuid::Uuid,
    /// Quantity purchased; must be at least 1.
    pub quantity: u32,
    /// Unit price in cents.
    pub unit_price: u64,
}

/// Aggregate stored in the [`super::OrderRegistry`]: the order row plus
/// everything scoped to it (items, bids, chat thread) and the bookkeeping
/// needed for ordered, idempotent event delivery.
///
/// The per-order `RwLock` around this struct is what serializes competing
/// `accept_bid` calls and status transitions.
#[derive(Debug)]
pub struct OrderEntry {
    /// The order row.
    pub order: Order,
    /// Frozen line items.
    pub items: Vec<OrderItem>,
    /// All bids ever placed on this order.
    pub bids: Vec<DeliveryBid>,
    /// Append-only chat thread.
    pub messages: Vec<Message>,
    /// Monotonically increasing mutation counter. Carried on every
    /// order-scoped event so subscribers can apply idempotently.
    pub version: u64,
    /// Next chat sequence number to assign.
    pub next_message_seq: u64,
}

impl OrderEntry {
    /// Creates an entry for a freshly checked-out order.
    #[must_use]
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self {
            order,
            items,
            bids: Vec::new(),
            messages: Vec::new(),
            version: 1,
            next_message_seq: 1,
        }
    }

    /// Bumps the mutation counter and refreshes `updated_at`, returning the
    /// new version. Call exactly once per committed mutation.
    pub fn touch(&mut self) -> u64 {
        self.version = self.version.saturating_add(1);
        self.order.updated_at = Utc::now();
        self.version
    }

    /// Applies a status transition after validating it against the graph
    /// in [`OrderStatus::can_transition`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidTransition`] (leaving the entry
    /// untouched) when the edge is not in the graph.
    pub fn transition(&mut self, to: OrderStatus) -> Result<u64, GatewayError> {
        let from = self.order.status;
        if !from.can_transition(to) {
            return Err(GatewayError::InvalidTransition { from, to });
        }
        self.order.status = to;
        Ok(self.touch())
    }

    /// Rebuilds an entry from a persisted snapshot, used on startup
    /// restore. The message counter resumes past the highest stored seq.
    #[must_use]
    pub fn from_snapshot(snapshot: OrderSnapshot) -> Self {
        let next_message_seq = snapshot
            .messages
            .iter()
            .map(|m| m.seq)
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        Self {
            order: snapshot.order,
            items: snapshot.items,
            bids: snapshot.bids,
            messages: snapshot.messages,
            version: snapshot.version,
            next_message_seq,
        }
    }
}

/// Full point-in-time view of an order entry.
///
/// Served to detail endpoints and to reconnecting tracking sessions,
/// which recover current state from a snapshot rather than from events
/// missed while disconnected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// The order row.
    pub order: Order,
    /// Frozen line items.
    pub items: Vec<OrderItem>,
    /// All bids on the order.
    pub bids: Vec<DeliveryBid>,
    /// Chat thread in seq order.
    pub messages: Vec<Message>,
    /// Order version at snapshot time.
    pub version: u64,
}

impl From<&OrderEntry> for OrderSnapshot {
    fn from(entry: &OrderEntry) -> Self {
        Self {
            order: entry.order.clone(),
            items: entry.items.clone(),
            bids: entry.bids.clone(),
            messages: entry.messages.clone(),
            version: entry.version,
        }
    }
}

/// Lightweight order summary for list endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderSummary {
    /// Order identifier.
    #[schema(value_type = uuid::Uuid)]
    pub id: OrderId,
    /// Owning customer.
    #[schema(value_type = uuid::Uuid)]
    pub customer_id: ActorId,
    /// Assigned driver, if matched.
    #[schema(value_type = Option<uuid::Uuid>)]
    pub driver_id: Option<ActorId>,
    /// Current status.
    pub status: OrderStatus,
    /// Order total in cents.
    pub total: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&OrderEntry> for OrderSummary {
    fn from(entry: &OrderEntry) -> Self {
        Self {
            id: entry.order.id,
            customer_id: entry.order.customer_id,
            driver_id: entry.order.driver_id,
            status: entry.order.status,
            total: entry.order.total,
            created_at: entry.order.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_order(status: OrderStatus) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(),
            customer_id: ActorId::new(),
            driver_id: None,
            store_id: uuid::Uuid::new_v4(),
            status,
            subtotal: 30_000,
            delivery_fee: 5_000,
            total: 35_000,
            delivery_address: "12 Rizal Ave".to_string(),
            delivery_coords: Coordinates {
                latitude: 14.5995,
                longitude: 120.9842,
            },
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn forward_chain_edges_are_legal() {
        assert!(OrderStatus::Pending.can_transition(OrderStatus::Matched));
        assert!(OrderStatus::Matched.can_transition(OrderStatus::Shopping));
        assert!(OrderStatus::Shopping.can_transition(OrderStatus::Delivering));
        assert!(OrderStatus::Delivering.can_transition(OrderStatus::Delivered));
    }

    #[test]
    fn skipping_a_state_is_illegal() {
        assert!(!OrderStatus::Pending.can_transition(OrderStatus::Shopping));
        assert!(!OrderStatus::Shopping.can_transition(OrderStatus::Delivered));
        assert!(!OrderStatus::Matched.can_transition(OrderStatus::Delivering));
    }

    #[test]
    fn cancel_reachable_from_non_terminal_only() {
        assert!(OrderStatus::Pending.can_transition(OrderStatus::Cancelled));
        assert!(OrderStatus::Delivering.can_transition(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition(OrderStatus::Cancelled));
    }

    #[test]
    fn no_backward_edges() {
        assert!(!OrderStatus::Matched.can_transition(OrderStatus::Pending));
        assert!(!OrderStatus::Delivered.can_transition(OrderStatus::Delivering));
    }

    #[test]
    fn transition_bumps_version_and_keeps_invalid_unchanged() {
        let mut entry = OrderEntry::new(make_order(OrderStatus::Pending), Vec::new());
        assert_eq!(entry.version, 1);

        let result = entry.transition(OrderStatus::Matched);
        let Ok(version) = result else {
            panic!("legal transition rejected");
        };
        assert_eq!(version, 2);
        assert_eq!(entry.order.status, OrderStatus::Matched);

        let result = entry.transition(OrderStatus::Delivered);
        assert!(matches!(
            result,
            Err(GatewayError::InvalidTransition {
                from: OrderStatus::Matched,
                to: OrderStatus::Delivered,
            })
        ));
        assert_eq!(entry.order.status, OrderStatus::Matched);
        assert_eq!(entry.version, 2);
    }

    #[test]
    fn recompute_total_holds_invariant() {
        let mut order = make_order(OrderStatus::Pending);
        order.delivery_fee = 6_000;
        order.recompute_total();
        assert_eq!(order.total, 36_000);
    }

    #[test]
    fn restore_resumes_message_seq_past_stored_thread() {
        let mut entry = OrderEntry::new(make_order(OrderStatus::Matched), Vec::new());
        let sender = ActorId::new();
        for seq in 1..=3 {
            entry.messages.push(Message::new(
                entry.order.id,
                sender,
                format!("msg {seq}"),
                seq,
            ));
        }
        entry.next_message_seq = 4;
        entry.version = 7;

        let snapshot = OrderSnapshot::from(&entry);
        let restored = OrderEntry::from_snapshot(snapshot);
        assert_eq!(restored.next_message_seq, 4);
        assert_eq!(restored.version, 7);
        assert_eq!(restored.messages.len(), 3);
    }

    #[test]
    fn message_seq_starts_at_one() {
        let entry = OrderEntry::new(make_order(OrderStatus::Pending), Vec::new());
        assert_eq!(entry.next_message_seq, 1);
        assert!(entry.messages.is_empty());
    }
}
