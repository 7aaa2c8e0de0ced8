//! Presence service: driver position pings and availability changes,
//! with fan-out scoped to the driver's active order.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::order::Coordinates;
use crate::domain::{ActorId, DeliveryEvent, DriverLocation, EventBus, PresenceTracker};
use crate::error::GatewayError;

/// Orchestration layer for driver presence.
#[derive(Debug, Clone)]
pub struct PresenceService {
    presence: Arc<PresenceTracker>,
    event_bus: EventBus,
}

impl PresenceService {
    /// Creates a new `PresenceService`.
    #[must_use]
    pub fn new(presence: Arc<PresenceTracker>, event_bus: EventBus) -> Self {
        Self {
            presence,
            event_bus,
        }
    }

    /// Upserts the driver's position and fans out a location event scoped
    /// to the order currently assigned to the driver, if any.
    ///
    /// The caller must be the owning driver device (the auth collaborator
    /// asserts this; no geographic plausibility check is performed).
    pub async fn update_location(
        &self,
        driver_id: ActorId,
        coords: Coordinates,
    ) -> DriverLocation {
        let (snapshot, assigned_order) = self.presence.update_location(driver_id, coords).await;

        let _ = self.event_bus.publish(DeliveryEvent::LocationUpdated {
            driver_id,
            order_id: assigned_order,
            latitude: snapshot.latitude,
            longitude: snapshot.longitude,
            timestamp: snapshot.updated_at,
        });

        tracing::trace!(%driver_id, lat = coords.latitude, lng = coords.longitude, "location ping");
        snapshot
    }

    /// Sets the availability flag, e.g. when a driver logs off.
    pub async fn set_availability(&self, driver_id: ActorId, available: bool) {
        self.presence.set_availability(driver_id, available).await;

        let _ = self.event_bus.publish(DeliveryEvent::AvailabilityChanged {
            driver_id,
            available,
            timestamp: Utc::now(),
        });
    }

    /// Returns the driver's last known location with its timestamp, so
    /// consumers can apply their own staleness policy.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DriverNotFound`] if the driver has never
    /// pinged a position.
    pub async fn get_location(&self, driver_id: ActorId) -> Result<DriverLocation, GatewayError> {
        self.presence.get(driver_id).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::OrderId;
    use tokio_test::assert_ok;

    fn make_service() -> (PresenceService, Arc<PresenceTracker>, EventBus) {
        let tracker = Arc::new(PresenceTracker::new());
        let bus = EventBus::new(1000);
        (
            PresenceService::new(Arc::clone(&tracker), bus.clone()),
            tracker,
            bus,
        )
    }

    #[tokio::test]
    async fn ping_emits_event_scoped_to_assigned_order() {
        let (service, tracker, bus) = make_service();
        let driver = ActorId::new();
        let order = OrderId::new();
        tracker.assign(driver, order).await;

        let mut rx = bus.subscribe();
        let snapshot = service
            .update_location(
                driver,
                Coordinates {
                    latitude: 14.6,
                    longitude: 121.0,
                },
            )
            .await;
        assert_eq!(snapshot.latitude, 14.6);

        let Ok(event) = rx.recv().await else {
            panic!("expected location event");
        };
        assert_eq!(event.event_type_str(), "location_updated");
        assert_eq!(event.order_id(), Some(order));
    }

    #[tokio::test]
    async fn unassigned_ping_has_no_order_scope() {
        let (service, _tracker, bus) = make_service();
        let mut rx = bus.subscribe();

        let _ = service
            .update_location(
                ActorId::new(),
                Coordinates {
                    latitude: 14.6,
                    longitude: 121.0,
                },
            )
            .await;

        let Ok(event) = rx.recv().await else {
            panic!("expected location event");
        };
        assert_eq!(event.order_id(), None);
    }

    #[tokio::test]
    async fn availability_toggle_round_trips() {
        let (service, tracker, _bus) = make_service();
        let driver = ActorId::new();

        service.set_availability(driver, false).await;
        assert!(!tracker.is_available(driver).await);

        service.set_availability(driver, true).await;
        assert!(tracker.is_available(driver).await);
    }

    #[tokio::test]
    async fn get_location_surfaces_timestamp() {
        let (service, _tracker, _bus) = make_service();
        let driver = ActorId::new();
        let _ = service
            .update_location(
                driver,
                Coordinates {
                    latitude: 14.6,
                    longitude: 121.0,
                },
            )
            .await;

        let location = assert_ok!(service.get_location(driver).await);
        assert!(!location.is_stale(chrono::Duration::minutes(2), Utc::now()));
    }
}
