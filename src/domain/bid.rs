//! Delivery bids: a driver's offer to fulfill a pending order.
//!
//! Bids model a reverse auction. The invariant enforced by the matching
//! service is that at most one bid per order ever reaches
//! [`BidStatus::Accepted`], and acceptance forces every sibling to
//! [`BidStatus::Rejected`] within the same per-order critical section.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{ActorId, BidId, OrderId};

/// Lifecycle status of a delivery bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    /// Awaiting a customer decision.
    Pending,
    /// Chosen by the customer; the driver is assigned the order.
    Accepted,
    /// Superseded, withdrawn by expiry, or orphaned by cancellation.
    Rejected,
}

impl BidStatus {
    /// Returns the status as a static string slice (snake_case).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for BidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A driver's offer to deliver a specific order at a stated fee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryBid {
    /// Unique bid identifier.
    pub id: BidId,
    /// The order this bid targets.
    pub order_id: OrderId,
    /// The bidding driver.
    pub driver_id: ActorId,
    /// Offered delivery fee in cents.
    pub amount: u64,
    /// Current bid status.
    pub status: BidStatus,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
}

impl DeliveryBid {
    /// Creates a new pending bid.
    #[must_use]
    pub fn new(order_id: OrderId, driver_id: ActorId, amount: u64) -> Self {
        Self {
            id: BidId::new(),
            order_id,
            driver_id,
            amount,
            status: BidStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Returns `true` if the bid still counts against the driver's
    /// one-active-bid-per-order limit.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self.status, BidStatus::Pending | BidStatus::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_bid_is_pending() {
        let bid = DeliveryBid::new(OrderId::new(), ActorId::new(), 5_000);
        assert_eq!(bid.status, BidStatus::Pending);
        assert!(bid.is_live());
    }

    #[test]
    fn rejected_bid_is_not_live() {
        let mut bid = DeliveryBid::new(OrderId::new(), ActorId::new(), 5_000);
        bid.status = BidStatus::Rejected;
        assert!(!bid.is_live());
    }

    #[test]
    fn status_display_is_snake_case() {
        assert_eq!(BidStatus::Accepted.to_string(), "accepted");
    }
}
