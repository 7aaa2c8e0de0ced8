//! Domain events reflecting order, bid, presence, and chat mutations.
//!
//! Every state change emits a [`DeliveryEvent`] through the
//! [`super::EventBus`] before the mutating call returns, so a tracking
//! session never observes a stale status after the triggering call
//! completed. Order-scoped events carry the order's mutation `version`;
//! subscribers apply idempotently keyed by entity id + version and simply
//! drop duplicates.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::bid::BidStatus;
use super::ids::{ActorId, BidId, MessageId, OrderId};
use super::order::OrderStatus;

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum DeliveryEvent {
    /// Emitted when a checkout creates a new order.
    OrderCreated {
        /// Order identifier.
        order_id: OrderId,
        /// Owning customer.
        customer_id: ActorId,
        /// Store the order is placed against.
        store_id: uuid::Uuid,
        /// Order total in cents.
        total: u64,
        /// Order version after the mutation.
        version: u64,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after every successful status transition.
    OrderStatusChanged {
        /// Order identifier.
        order_id: OrderId,
        /// Status before the transition.
        previous: OrderStatus,
        /// Status after the transition.
        status: OrderStatus,
        /// Assigned driver after the transition, if any.
        driver_id: Option<ActorId>,
        /// Order version after the mutation.
        version: u64,
        /// Transition timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when the delivery fee is adjusted while the order is pending.
    DeliveryFeeUpdated {
        /// Order identifier.
        order_id: OrderId,
        /// New delivery fee in cents.
        delivery_fee: u64,
        /// Recomputed order total in cents.
        total: u64,
        /// Order version after the mutation.
        version: u64,
        /// Adjustment timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a driver submits a bid on a pending order.
    BidPlaced {
        /// Order identifier.
        order_id: OrderId,
        /// Bid identifier.
        bid_id: BidId,
        /// Bidding driver.
        driver_id: ActorId,
        /// Offered delivery fee in cents.
        amount: u64,
        /// Order version after the mutation.
        version: u64,
        /// Submission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted for every bid whose status is decided: the accepted winner,
    /// each sibling rejected by acceptance, expiry, or cancellation.
    /// Rejected bidders use this to stop expecting assignment.
    BidResolved {
        /// Order identifier.
        order_id: OrderId,
        /// Bid identifier.
        bid_id: BidId,
        /// The bid's driver.
        driver_id: ActorId,
        /// Final bid status (accepted or rejected).
        status: BidStatus,
        /// Order version after the mutation.
        version: u64,
        /// Resolution timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted on every driver position ping.
    LocationUpdated {
        /// The driver that moved.
        driver_id: ActorId,
        /// The order currently assigned to the driver, if any. Tracking
        /// sessions subscribed to that order receive the event.
        order_id: Option<OrderId>,
        /// Latitude in decimal degrees.
        latitude: f64,
        /// Longitude in decimal degrees.
        longitude: f64,
        /// Ping timestamp; consumers apply their own staleness policy.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a driver's availability flag changes.
    AvailabilityChanged {
        /// The driver whose flag changed.
        driver_id: ActorId,
        /// New availability value.
        available: bool,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a participant posts a chat message.
    MessagePosted {
        /// Order identifier.
        order_id: OrderId,
        /// Message identifier.
        message_id: MessageId,
        /// Message author.
        sender_id: ActorId,
        /// Position within the order's thread.
        seq: u64,
        /// Message body.
        content: String,
        /// Order version after the mutation.
        version: u64,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when the counterpart marks a message as read.
    MessageRead {
        /// Order identifier.
        order_id: OrderId,
        /// Message identifier.
        message_id: MessageId,
        /// The participant who read the message.
        reader_id: ActorId,
        /// Order version after the mutation.
        version: u64,
        /// Read timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl DeliveryEvent {
    /// Returns the order this event is scoped to, if any.
    #[must_use]
    pub const fn order_id(&self) -> Option<OrderId> {
        match self {
            Self::OrderCreated { order_id, .. }
            | Self::OrderStatusChanged { order_id, .. }
            | Self::DeliveryFeeUpdated { order_id, .. }
            | Self::BidPlaced { order_id, .. }
            | Self::BidResolved { order_id, .. }
            | Self::MessagePosted { order_id, .. }
            | Self::MessageRead { order_id, .. } => Some(*order_id),
            Self::LocationUpdated { order_id, .. } => *order_id,
            Self::AvailabilityChanged { .. } => None,
        }
    }

    /// Returns the driver this event is scoped to, if any.
    #[must_use]
    pub const fn driver_id(&self) -> Option<ActorId> {
        match self {
            Self::BidPlaced { driver_id, .. }
            | Self::BidResolved { driver_id, .. }
            | Self::LocationUpdated { driver_id, .. }
            | Self::AvailabilityChanged { driver_id, .. } => Some(*driver_id),
            Self::OrderStatusChanged { driver_id, .. } => *driver_id,
            Self::OrderCreated { .. }
            | Self::DeliveryFeeUpdated { .. }
            | Self::MessagePosted { .. }
            | Self::MessageRead { .. } => None,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::OrderCreated { .. } => "order_created",
            Self::OrderStatusChanged { .. } => "order_status_changed",
            Self::DeliveryFeeUpdated { .. } => "delivery_fee_updated",
            Self::BidPlaced { .. } => "bid_placed",
            Self::BidResolved { .. } => "bid_resolved",
            Self::LocationUpdated { .. } => "location_updated",
            Self::AvailabilityChanged { .. } => "availability_changed",
            Self::MessagePosted { .. } => "message_posted",
            Self::MessageRead { .. } => "message_read",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn status_changed_event_type() {
        let event = DeliveryEvent::OrderStatusChanged {
            order_id: OrderId::new(),
            previous: OrderStatus::Pending,
            status: OrderStatus::Matched,
            driver_id: Some(ActorId::new()),
            version: 2,
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type_str(), "order_status_changed");
    }

    #[test]
    fn bid_resolved_serializes() {
        let event = DeliveryEvent::BidResolved {
            order_id: OrderId::new(),
            bid_id: BidId::new(),
            driver_id: ActorId::new(),
            status: BidStatus::Rejected,
            version: 3,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event);
        let Ok(json) = json else {
            panic!("serialization failed");
        };
        assert!(json.contains("bid_resolved"));
        assert!(json.contains("rejected"));
    }

    #[test]
    fn order_id_accessor_covers_location_scope() {
        let driver = ActorId::new();
        let order = OrderId::new();
        let scoped = DeliveryEvent::LocationUpdated {
            driver_id: driver,
            order_id: Some(order),
            latitude: 14.6,
            longitude: 121.0,
            timestamp: Utc::now(),
        };
        assert_eq!(scoped.order_id(), Some(order));
        assert_eq!(scoped.driver_id(), Some(driver));

        let unscoped = DeliveryEvent::AvailabilityChanged {
            driver_id: driver,
            available: true,
            timestamp: Utc::now(),
        };
        assert_eq!(unscoped.order_id(), None);
    }
}
