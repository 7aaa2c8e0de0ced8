//! Order-related DTOs for checkout, detail, list, and transition requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::{ActorDto, PaginationMeta};
use crate::domain::{NewOrderItem, OrderId, OrderStatus, OrderSummary};

/// Request body for `POST /orders` (checkout).
///
/// The cart is an external producer: it hands over an ordered list of
/// priced line items and the gateway freezes them into the order.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// The customer placing the order.
    pub customer_id: uuid::Uuid,
    /// The store the items come from.
    pub store_id: uuid::Uuid,
    /// Line items with catalog prices frozen by the cart.
    pub items: Vec<NewOrderItem>,
    /// Free-form delivery address.
    pub delivery_address: String,
    /// Delivery latitude in decimal degrees.
    pub latitude: f64,
    /// Delivery longitude in decimal degrees.
    pub longitude: f64,
    /// Optional notes for the driver.
    #[serde(default)]
    pub notes: Option<String>,
    /// Initial delivery fee in cents.
    pub delivery_fee: u64,
}

/// Response body for `POST /orders` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    /// Unique order identifier.
    #[schema(value_type = uuid::Uuid)]
    pub order_id: OrderId,
    /// Initial status (always `pending`).
    pub status: OrderStatus,
    /// Sum of line subtotals in cents.
    pub subtotal: u64,
    /// Delivery fee in cents.
    pub delivery_fee: u64,
    /// Order total in cents.
    pub total: u64,
    /// Server creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /orders/{id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionRequest {
    /// The acting party.
    #[serde(flatten)]
    pub actor: ActorDto,
    /// Requested target status.
    pub status: OrderStatus,
}

/// Request body for `POST /orders/{id}/cancel`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelOrderRequest {
    /// The acting party.
    #[serde(flatten)]
    pub actor: ActorDto,
}

/// Request body for `POST /orders/{id}/fee`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustFeeRequest {
    /// The acting party.
    #[serde(flatten)]
    pub actor: ActorDto,
    /// New delivery fee in cents.
    pub delivery_fee: u64,
}

/// Query parameters for `GET /orders`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct OrderListParams {
    /// Restrict to orders placed by this customer.
    #[serde(default)]
    pub customer_id: Option<uuid::Uuid>,
    /// Restrict to orders assigned to this driver.
    #[serde(default)]
    pub driver_id: Option<uuid::Uuid>,
    /// Restrict to orders in this status.
    #[serde(default)]
    pub status: Option<OrderStatus>,
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

/// Paginated list response for `GET /orders`.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    /// Order summaries, newest first.
    pub data: Vec<OrderSummary>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
