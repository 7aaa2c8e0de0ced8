//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Conflict-class variants (`OrderNotPending`, `BidNotPending`, ...) are
//! expected outcomes of concurrent matching, not faults: a driver client
//! receiving `OrderNotPending` after an accept race knows someone else won.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::OrderStatus;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2101,
///     "message": "order is no longer pending",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status                |
/// |-----------|---------------------|----------------------------|
/// | 1000–1999 | Validation          | 400 Bad Request            |
/// | 2000–2099 | Not Found           | 404 Not Found              |
/// | 2100–2199 | State Conflict      | 409 Conflict               |
/// | 2200–2299 | Authorization       | 403 Forbidden              |
/// | 3000–3999 | Server              | 500 Internal Server Error  |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Order with the given ID was not found.
    #[error("order not found: {0}")]
    OrderNotFound(uuid::Uuid),

    /// Bid with the given ID was not found on the order.
    #[error("bid not found: {0}")]
    BidNotFound(uuid::Uuid),

    /// Message with the given ID was not found on the order.
    #[error("message not found: {0}")]
    MessageNotFound(uuid::Uuid),

    /// No location record exists for the given driver.
    #[error("no location recorded for driver {0}")]
    DriverNotFound(uuid::Uuid),

    /// The requested order status change is not in the transition graph.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        /// Status the order currently holds.
        from: OrderStatus,
        /// Status that was requested.
        to: OrderStatus,
    },

    /// The acting party does not own the entity it tried to mutate.
    #[error("actor {actor} is not authorized to {action}")]
    Unauthorized {
        /// The offending actor id.
        actor: uuid::Uuid,
        /// Short description of the attempted action.
        action: String,
    },

    /// The order left the pending state before the call could act on it.
    /// For a losing `accept_bid` caller this means another bid won the race.
    #[error("order is no longer pending")]
    OrderNotPending,

    /// The targeted bid is not in the pending state.
    #[error("bid is no longer pending")]
    BidNotPending,

    /// The driver already holds a non-rejected bid on this order.
    #[error("driver already has an active bid on this order")]
    DuplicateBid,

    /// Messaging requires an assigned driver counterpart.
    #[error("order has no assigned driver yet")]
    OrderNotActive,

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::OrderNotFound(_) => 2001,
            Self::BidNotFound(_) => 2002,
            Self::MessageNotFound(_) => 2003,
            Self::DriverNotFound(_) => 2004,
            Self::InvalidTransition { .. } => 2101,
            Self::OrderNotPending => 2102,
            Self::BidNotPending => 2103,
            Self::DuplicateBid => 2104,
            Self::OrderNotActive => 2105,
            Self::Unauthorized { .. } => 2201,
            Self::PersistenceError(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::OrderNotFound(_)
            | Self::BidNotFound(_)
            | Self::MessageNotFound(_)
            | Self::DriverNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidTransition { .. }
            | Self::OrderNotPending
            | Self::BidNotPending
            | Self::DuplicateBid
            | Self::OrderNotActive => StatusCode::CONFLICT,
            Self::Unauthorized { .. } => StatusCode::FORBIDDEN,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn conflict_variants_map_to_409() {
        for err in [
            GatewayError::OrderNotPending,
            GatewayError::BidNotPending,
            GatewayError::DuplicateBid,
            GatewayError::OrderNotActive,
            GatewayError::InvalidTransition {
                from: OrderStatus::Shopping,
                to: OrderStatus::Delivered,
            },
        ] {
            assert_eq!(err.status_code(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn unauthorized_maps_to_403() {
        let err = GatewayError::Unauthorized {
            actor: uuid::Uuid::new_v4(),
            action: "accept bid".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_code(), 2201);
    }

    #[test]
    fn invalid_transition_names_both_states() {
        let err = GatewayError::InvalidTransition {
            from: OrderStatus::Shopping,
            to: OrderStatus::Delivered,
        };
        let msg = err.to_string();
        assert!(msg.contains("shopping"));
        assert!(msg.contains("delivered"));
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = GatewayError::OrderNotFound(uuid::Uuid::new_v4());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
