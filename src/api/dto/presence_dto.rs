//! Presence-related DTOs for location pings and availability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::DriverLocation;

/// Request body for `PUT /drivers/{id}/location`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLocationRequest {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// Request body for `PUT /drivers/{id}/availability`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetAvailabilityRequest {
    /// New availability value.
    pub available: bool,
}

/// Response body for location endpoints.
///
/// Always carries the ping timestamp together with an advisory staleness
/// threshold: a record older than `stale_after_secs` should be treated as
/// unknown position, not a false last-known one.
#[derive(Debug, Serialize, ToSchema)]
pub struct LocationResponse {
    /// The driver this record belongs to.
    pub driver_id: uuid::Uuid,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Whether the driver accepts new orders.
    pub is_available: bool,
    /// Timestamp of the last position ping.
    pub updated_at: DateTime<Utc>,
    /// Advisory staleness threshold in seconds (deployment config).
    pub stale_after_secs: u64,
}

impl LocationResponse {
    /// Builds a response from a presence snapshot and the configured
    /// staleness hint.
    #[must_use]
    pub fn from_location(location: DriverLocation, stale_after_secs: u64) -> Self {
        Self {
            driver_id: *location.driver_id.as_uuid(),
            latitude: location.latitude,
            longitude: location.longitude,
            is_available: location.is_available,
            updated_at: location.updated_at,
            stale_after_secs,
        }
    }
}
