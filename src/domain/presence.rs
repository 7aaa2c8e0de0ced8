//! Driver presence: live location, availability, and active assignment.
//!
//! One record per driver, not per order. The owning driver's client is the
//! only writer of its location; any tracking session whose order is
//! assigned to the driver reads it. The tracker never expires records:
//! consumers receive the timestamp alongside the coordinates and apply
//! their own staleness policy ([`DriverLocation::is_stale`]).

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use super::ids::{ActorId, OrderId};
use super::order::Coordinates;
use crate::error::GatewayError;

/// Snapshot of a driver's presence, as returned to consumers.
#[derive(Debug, Clone, Serialize)]
pub struct DriverLocation {
    /// The driver this record belongs to.
    pub driver_id: ActorId,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Whether the driver accepts new orders.
    pub is_available: bool,
    /// Timestamp of the last position ping.
    pub updated_at: DateTime<Utc>,
}

impl DriverLocation {
    /// Returns `true` if the record is older than `threshold` as of `now`.
    /// Stale locations should be treated as unknown, not as a false
    /// last-known position.
    #[must_use]
    pub fn is_stale(&self, threshold: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.updated_at) > threshold
    }
}

#[derive(Debug)]
struct DriverPresence {
    location: Option<Coordinates>,
    is_available: bool,
    assigned_order: Option<OrderId>,
    updated_at: DateTime<Utc>,
}

impl DriverPresence {
    fn new() -> Self {
        Self {
            location: None,
            is_available: true,
            assigned_order: None,
            updated_at: Utc::now(),
        }
    }
}

/// Maintains current location, availability, and active assignment per
/// driver.
///
/// Location is single-writer (the owning driver) / multi-reader. The
/// driver-to-order assignment index recorded here is what scopes
/// location events to the right tracking sessions.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    drivers: RwLock<HashMap<ActorId, DriverPresence>>,
}

impl PresenceTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts the driver's position and refreshes the timestamp.
    ///
    /// Returns the updated snapshot together with the order currently
    /// assigned to the driver, so the caller can scope the fan-out event.
    /// No geographic plausibility check is performed; the caller is
    /// trusted to be the driver device.
    pub async fn update_location(
        &self,
        driver_id: ActorId,
        coords: Coordinates,
    ) -> (DriverLocation, Option<OrderId>) {
        let mut map = self.drivers.write().await;
        let presence = map.entry(driver_id).or_insert_with(DriverPresence::new);
        presence.location = Some(coords);
        presence.updated_at = Utc::now();

        let snapshot = DriverLocation {
            driver_id,
            latitude: coords.latitude,
            longitude: coords.longitude,
            is_available: presence.is_available,
            updated_at: presence.updated_at,
        };
        (snapshot, presence.assigned_order)
    }

    /// Sets the availability flag independently of location, e.g. when a
    /// driver logs off.
    pub async fn set_availability(&self, driver_id: ActorId, available: bool) {
        let mut map = self.drivers.write().await;
        let presence = map.entry(driver_id).or_insert_with(DriverPresence::new);
        presence.is_available = available;
    }

    /// Records that the driver now holds the given order and flips
    /// availability to `false`. Called under the order's write lock when a
    /// bid is accepted.
    pub async fn assign(&self, driver_id: ActorId, order_id: OrderId) {
        let mut map = self.drivers.write().await;
        let presence = map.entry(driver_id).or_insert_with(DriverPresence::new);
        presence.assigned_order = Some(order_id);
        presence.is_available = false;
    }

    /// Clears the driver's active assignment and restores availability.
    /// Called when the assigned order reaches a terminal status.
    pub async fn release(&self, driver_id: ActorId) {
        let mut map = self.drivers.write().await;
        if let Some(presence) = map.get_mut(&driver_id) {
            presence.assigned_order = None;
            presence.is_available = true;
        }
    }

    /// Returns the driver's current location snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DriverNotFound`] if the driver has never
    /// pinged a position.
    pub async fn get(&self, driver_id: ActorId) -> Result<DriverLocation, GatewayError> {
        let map = self.drivers.read().await;
        let presence = map
            .get(&driver_id)
            .ok_or(GatewayError::DriverNotFound(*driver_id.as_uuid()))?;
        let coords = presence
            .location
            .ok_or(GatewayError::DriverNotFound(*driver_id.as_uuid()))?;
        Ok(DriverLocation {
            driver_id,
            latitude: coords.latitude,
            longitude: coords.longitude,
            is_available: presence.is_available,
            updated_at: presence.updated_at,
        })
    }

    /// Returns the driver's availability flag, defaulting to `true` for
    /// drivers the tracker has never seen.
    pub async fn is_available(&self, driver_id: ActorId) -> bool {
        let map = self.drivers.read().await;
        map.get(&driver_id).is_none_or(|p| p.is_available)
    }

    /// Returns the order currently assigned to the driver, if any.
    pub async fn assigned_order(&self, driver_id: ActorId) -> Option<OrderId> {
        let map = self.drivers.read().await;
        map.get(&driver_id).and_then(|p| p.assigned_order)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn coords(lat: f64, lng: f64) -> Coordinates {
        Coordinates {
            latitude: lat,
            longitude: lng,
        }
    }

    #[tokio::test]
    async fn update_location_upserts_and_scopes() {
        let tracker = PresenceTracker::new();
        let driver = ActorId::new();

        let (snapshot, assigned) = tracker.update_location(driver, coords(14.6, 121.0)).await;
        assert_eq!(snapshot.latitude, 14.6);
        assert!(snapshot.is_available);
        assert_eq!(assigned, None);

        let order = OrderId::new();
        tracker.assign(driver, order).await;
        let (snapshot, assigned) = tracker.update_location(driver, coords(14.7, 121.1)).await;
        assert_eq!(snapshot.longitude, 121.1);
        assert!(!snapshot.is_available);
        assert_eq!(assigned, Some(order));
    }

    #[tokio::test]
    async fn assign_and_release_drive_availability() {
        let tracker = PresenceTracker::new();
        let driver = ActorId::new();
        assert!(tracker.is_available(driver).await);

        tracker.assign(driver, OrderId::new()).await;
        assert!(!tracker.is_available(driver).await);

        tracker.release(driver).await;
        assert!(tracker.is_available(driver).await);
        assert_eq!(tracker.assigned_order(driver).await, None);
    }

    #[tokio::test]
    async fn get_unknown_driver_is_not_found() {
        let tracker = PresenceTracker::new();
        let result = tracker.get(ActorId::new()).await;
        assert!(matches!(result, Err(GatewayError::DriverNotFound(_))));
    }

    #[tokio::test]
    async fn availability_without_location_is_not_a_location() {
        let tracker = PresenceTracker::new();
        let driver = ActorId::new();
        tracker.set_availability(driver, false).await;

        assert!(!tracker.is_available(driver).await);
        // Still no coordinates to report.
        assert!(tracker.get(driver).await.is_err());
    }

    #[test]
    fn staleness_is_consumer_side() {
        let loc = DriverLocation {
            driver_id: ActorId::new(),
            latitude: 14.6,
            longitude: 121.0,
            is_available: true,
            updated_at: Utc::now() - Duration::seconds(180),
        };
        assert!(loc.is_stale(Duration::seconds(120), Utc::now()));
        assert!(!loc.is_stale(Duration::seconds(300), Utc::now()));
    }
}
