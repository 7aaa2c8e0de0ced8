//! Bid-related DTOs for submission, listing, and acceptance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{BidId, BidStatus, DeliveryBid, OrderId};

/// Request body for `POST /orders/{id}/bids`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitBidRequest {
    /// The bidding driver.
    pub driver_id: uuid::Uuid,
    /// Offered delivery fee in cents.
    pub amount: u64,
}

/// Request body for `POST /orders/{id}/bids/{bid_id}/accept`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AcceptBidRequest {
    /// The acting customer; must own the order.
    pub customer_id: uuid::Uuid,
}

/// A single bid as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct BidDto {
    /// Bid identifier.
    #[schema(value_type = uuid::Uuid)]
    pub bid_id: BidId,
    /// The order the bid targets.
    #[schema(value_type = uuid::Uuid)]
    pub order_id: OrderId,
    /// The bidding driver.
    pub driver_id: uuid::Uuid,
    /// Offered delivery fee in cents.
    pub amount: u64,
    /// Current bid status.
    pub status: BidStatus,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<DeliveryBid> for BidDto {
    fn from(bid: DeliveryBid) -> Self {
        Self {
            bid_id: bid.id,
            order_id: bid.order_id,
            driver_id: *bid.driver_id.as_uuid(),
            amount: bid.amount,
            status: bid.status,
            created_at: bid.created_at,
        }
    }
}

/// Response body for `GET /orders/{id}/bids`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BidListResponse {
    /// All bids on the order in submission order.
    pub data: Vec<BidDto>,
}
