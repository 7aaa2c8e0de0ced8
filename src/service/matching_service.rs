//! Matching service: resolves many-drivers-bid-for-one-order contention
//! into a single assignment without races.
//!
//! Bids model a reverse auction. Acceptance runs entirely under the
//! per-order write lock: the winning bid, every sibling rejection, the
//! driver assignment, the `pending → matched` transition, and the
//! availability flip commit together. No reader of the order can observe
//! a window where two bids are accepted, or where the winning bid is
//! accepted while the order is still pending. Concurrent `accept_bid`
//! calls serialize on the lock; the loser finds the order no longer
//! pending.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    ActorId, BidId, BidStatus, DeliveryBid, DeliveryEvent, EventBus, OrderFilter, OrderId,
    OrderRegistry, OrderStatus, PresenceTracker,
};
use crate::error::GatewayError;

/// Orchestration layer for bid submission, acceptance, and expiry.
#[derive(Debug, Clone)]
pub struct MatchingService {
    registry: Arc<OrderRegistry>,
    presence: Arc<PresenceTracker>,
    event_bus: EventBus,
}

impl MatchingService {
    /// Creates a new `MatchingService`.
    #[must_use]
    pub fn new(
        registry: Arc<OrderRegistry>,
        presence: Arc<PresenceTracker>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            registry,
            presence,
            event_bus,
        }
    }

    /// Submits a driver's bid on a pending order.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::OrderNotPending`] when the order already left the
    ///   pending state.
    /// - [`GatewayError::DuplicateBid`] when the driver already holds a
    ///   non-rejected bid on this order.
    pub async fn submit_bid(
        &self,
        order_id: OrderId,
        driver_id: ActorId,
        amount: u64,
    ) -> Result<DeliveryBid, GatewayError> {
        let entry_lock = self.registry.get(order_id).await?;
        let mut entry = entry_lock.write().await;

        if entry.order.status != OrderStatus::Pending {
            return Err(GatewayError::OrderNotPending);
        }
        if entry
            .bids
            .iter()
            .any(|b| b.driver_id == driver_id && b.is_live())
        {
            return Err(GatewayError::DuplicateBid);
        }

        let bid = DeliveryBid::new(order_id, driver_id, amount);
        entry.bids.push(bid.clone());
        let version = entry.touch();

        let _ = self.event_bus.publish(DeliveryEvent::BidPlaced {
            order_id,
            bid_id: bid.id,
            driver_id,
            amount,
            version,
            timestamp: bid.created_at,
        });
        drop(entry);

        tracing::debug!(%order_id, %driver_id, amount, "bid placed");
        Ok(bid)
    }

    /// Accepts one bid and rejects all siblings as a single atomic unit.
    ///
    /// On success the order is matched to the bid's driver, the driver's
    /// availability is false, and a `BidResolved` event for every decided
    /// bid plus the `OrderStatusChanged` event are on the bus before the
    /// call returns.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::OrderNotPending`] when the order is no longer
    ///   pending, including when a concurrent acceptance won the race.
    /// - [`GatewayError::Unauthorized`] unless the acting customer owns
    ///   the order.
    /// - [`GatewayError::BidNotFound`] / [`GatewayError::BidNotPending`]
    ///   for an unknown or already-decided bid.
    pub async fn accept_bid(
        &self,
        order_id: OrderId,
        bid_id: BidId,
        acting_customer: ActorId,
    ) -> Result<DeliveryBid, GatewayError> {
        let entry_lock = self.registry.get(order_id).await?;
        let mut entry = entry_lock.write().await;

        if entry.order.status != OrderStatus::Pending {
            return Err(GatewayError::OrderNotPending);
        }
        if entry.order.customer_id != acting_customer {
            return Err(GatewayError::Unauthorized {
                actor: *acting_customer.as_uuid(),
                action: format!("accept a bid on order {order_id}"),
            });
        }

        let winner_idx = entry
            .bids
            .iter()
            .position(|b| b.id == bid_id)
            .ok_or(GatewayError::BidNotFound(*bid_id.as_uuid()))?;
        if entry.bids.get(winner_idx).map(|b| b.status) != Some(BidStatus::Pending) {
            return Err(GatewayError::BidNotPending);
        }

        // Commit point: everything below happens under the write lock.
        let mut resolved = Vec::with_capacity(entry.bids.len());
        let mut winner_driver = None;
        for (idx, bid) in entry.bids.iter_mut().enumerate() {
            if idx == winner_idx {
                bid.status = BidStatus::Accepted;
                winner_driver = Some(bid.driver_id);
            } else if bid.status == BidStatus::Pending {
                bid.status = BidStatus::Rejected;
            } else {
                continue;
            }
            resolved.push((bid.id, bid.driver_id, bid.status));
        }
        let driver_id = winner_driver.ok_or_else(|| {
            GatewayError::Internal("accepted bid lost during resolution".to_string())
        })?;

        entry.order.driver_id = Some(driver_id);
        let previous = entry.order.status;
        let version = entry.transition(OrderStatus::Matched)?;
        self.presence.assign(driver_id, order_id).await;

        for (id, bidder, status) in resolved {
            let _ = self.event_bus.publish(DeliveryEvent::BidResolved {
                order_id,
                bid_id: id,
                driver_id: bidder,
                status,
                version,
                timestamp: Utc::now(),
            });
        }
        let _ = self.event_bus.publish(DeliveryEvent::OrderStatusChanged {
            order_id,
            previous,
            status: entry.order.status,
            driver_id: Some(driver_id),
            version,
            timestamp: Utc::now(),
        });
        let _ = self.event_bus.publish(DeliveryEvent::AvailabilityChanged {
            driver_id,
            available: false,
            timestamp: Utc::now(),
        });

        let winner = entry
            .bids
            .iter()
            .find(|b| b.id == bid_id)
            .cloned()
            .ok_or_else(|| GatewayError::Internal("winning bid vanished".to_string()))?;
        drop(entry);

        tracing::info!(%order_id, %bid_id, %driver_id, "bid accepted, order matched");
        Ok(winner)
    }

    /// Returns all bids on the order in submission order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::OrderNotFound`] for an unknown id.
    pub async fn list_bids(&self, order_id: OrderId) -> Result<Vec<DeliveryBid>, GatewayError> {
        let entry_lock = self.registry.get(order_id).await?;
        let entry = entry_lock.read().await;
        Ok(entry.bids.clone())
    }

    /// Rejects pending bids older than `max_age` on all pending orders.
    ///
    /// Design extension point: orders accumulate stale bids without a TTL,
    /// so deployments may run this sweep periodically (see
    /// `BID_EXPIRY_SECS`). Returns the number of bids rejected.
    pub async fn expire_stale_bids(&self, max_age: chrono::Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let pending_orders = self
            .registry
            .collect(OrderFilter {
                status: Some(OrderStatus::Pending),
                ..OrderFilter::default()
            })
            .await;

        let mut expired = 0;
        for entry_lock in pending_orders {
            let mut entry = entry_lock.write().await;
            // Status may have changed between collect and lock acquisition.
            if entry.order.status != OrderStatus::Pending {
                continue;
            }
            let mut resolved = Vec::new();
            for bid in &mut entry.bids {
                if bid.status == BidStatus::Pending && bid.created_at < cutoff {
                    bid.status = BidStatus::Rejected;
                    resolved.push((bid.id, bid.driver_id));
                }
            }
            if resolved.is_empty() {
                continue;
            }
            let version = entry.touch();
            let order_id = entry.order.id;
            for (bid_id, driver_id) in resolved {
                expired += 1;
                let _ = self.event_bus.publish(DeliveryEvent::BidResolved {
                    order_id,
                    bid_id,
                    driver_id,
                    status: BidStatus::Rejected,
                    version,
                    timestamp: Utc::now(),
                });
            }
        }

        if expired > 0 {
            tracing::info!(expired, "expired stale bids");
        }
        expired
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::order::{Coordinates, NewOrderItem};
    use crate::service::order_service::{CheckoutSpec, OrderService};
    use tokio_test::assert_ok;

    struct Fixture {
        orders: OrderService,
        matching: MatchingService,
        presence: Arc<PresenceTracker>,
    }

    fn make_fixture() -> Fixture {
        let registry = Arc::new(OrderRegistry::new());
        let presence = Arc::new(PresenceTracker::new());
        let bus = EventBus::new(1000);
        Fixture {
            orders: OrderService::new(Arc::clone(&registry), Arc::clone(&presence), bus.clone()),
            matching: MatchingService::new(registry, Arc::clone(&presence), bus),
            presence,
        }
    }

    async fn place_order(fixture: &Fixture, customer: ActorId) -> OrderId {
        let spec = CheckoutSpec {
            customer_id: customer,
            store_id: uuid::Uuid::new_v4(),
            items: vec![NewOrderItem {
                product_id: uuid::Uuid::new_v4(),
                quantity: 3,
                unit_price: 10_000,
            }],
            delivery_address: "12 Rizal Ave".to_string(),
            delivery_coords: Coordinates {
                latitude: 14.5995,
                longitude: 120.9842,
            },
            notes: None,
            delivery_fee: 5_000,
        };
        let order = assert_ok!(fixture.orders.create_order(spec).await);
        order.id
    }

    #[tokio::test]
    async fn accept_resolves_all_bids_and_matches_order() {
        let fixture = make_fixture();
        let customer = ActorId::new();
        let order_id = place_order(&fixture, customer).await;

        let driver_a = ActorId::new();
        let driver_b = ActorId::new();
        let bid_a = assert_ok!(fixture.matching.submit_bid(order_id, driver_a, 5_000).await);
        let _bid_b = assert_ok!(fixture.matching.submit_bid(order_id, driver_b, 6_000).await);

        let winner = assert_ok!(fixture.matching.accept_bid(order_id, bid_a.id, customer).await);
        assert_eq!(winner.status, BidStatus::Accepted);
        assert_eq!(winner.driver_id, driver_a);

        let bids = assert_ok!(fixture.matching.list_bids(order_id).await);
        let accepted = bids.iter().filter(|b| b.status == BidStatus::Accepted).count();
        let rejected = bids.iter().filter(|b| b.status == BidStatus::Rejected).count();
        assert_eq!(accepted, 1);
        assert_eq!(rejected, 1);

        let snapshot = assert_ok!(fixture.orders.snapshot(order_id).await);
        assert_eq!(snapshot.order.status, OrderStatus::Matched);
        assert_eq!(snapshot.order.driver_id, Some(driver_a));
        assert!(!fixture.presence.is_available(driver_a).await);
        assert!(fixture.presence.is_available(driver_b).await);
    }

    #[tokio::test]
    async fn duplicate_bid_by_same_driver_is_rejected() {
        let fixture = make_fixture();
        let order_id = place_order(&fixture, ActorId::new()).await;
        let driver = ActorId::new();

        let _ = assert_ok!(fixture.matching.submit_bid(order_id, driver, 5_000).await);
        let result = fixture.matching.submit_bid(order_id, driver, 4_500).await;
        assert!(matches!(result, Err(GatewayError::DuplicateBid)));
    }

    #[tokio::test]
    async fn bid_on_matched_order_is_not_pending() {
        let fixture = make_fixture();
        let customer = ActorId::new();
        let order_id = place_order(&fixture, customer).await;

        let bid = assert_ok!(
            fixture
                .matching
                .submit_bid(order_id, ActorId::new(), 5_000)
                .await
        );
        let _ = assert_ok!(fixture.matching.accept_bid(order_id, bid.id, customer).await);

        let result = fixture
            .matching
            .submit_bid(order_id, ActorId::new(), 4_000)
            .await;
        assert!(matches!(result, Err(GatewayError::OrderNotPending)));
    }

    #[tokio::test]
    async fn accept_by_non_owner_is_unauthorized() {
        let fixture = make_fixture();
        let order_id = place_order(&fixture, ActorId::new()).await;
        let bid = assert_ok!(
            fixture
                .matching
                .submit_bid(order_id, ActorId::new(), 5_000)
                .await
        );

        let result = fixture
            .matching
            .accept_bid(order_id, bid.id, ActorId::new())
            .await;
        assert!(matches!(result, Err(GatewayError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn accepting_a_rejected_bid_is_bid_not_pending() {
        let fixture = make_fixture();
        let customer = ActorId::new();
        let order_id = place_order(&fixture, customer).await;

        let loser = assert_ok!(
            fixture
                .matching
                .submit_bid(order_id, ActorId::new(), 6_000)
                .await
        );
        let winner = assert_ok!(
            fixture
                .matching
                .submit_bid(order_id, ActorId::new(), 5_000)
                .await
        );
        let _ = assert_ok!(
            fixture
                .matching
                .accept_bid(order_id, winner.id, customer)
                .await
        );

        // The order is matched now, so the pending check fires first.
        let result = fixture.matching.accept_bid(order_id, loser.id, customer).await;
        assert!(matches!(result, Err(GatewayError::OrderNotPending)));
    }

    #[tokio::test]
    async fn concurrent_accepts_produce_exactly_one_winner() {
        let fixture = make_fixture();
        let customer = ActorId::new();
        let order_id = place_order(&fixture, customer).await;

        let bid_a = assert_ok!(
            fixture
                .matching
                .submit_bid(order_id, ActorId::new(), 5_000)
                .await
        );
        let bid_b = assert_ok!(
            fixture
                .matching
                .submit_bid(order_id, ActorId::new(), 6_000)
                .await
        );

        let m1 = fixture.matching.clone();
        let m2 = fixture.matching.clone();
        let t1 = tokio::spawn(async move { m1.accept_bid(order_id, bid_a.id, customer).await });
        let t2 = tokio::spawn(async move { m2.accept_bid(order_id, bid_b.id, customer).await });

        let (r1, r2) = tokio::join!(t1, t2);
        let (Ok(r1), Ok(r2)) = (r1, r2) else {
            panic!("accept task panicked");
        };

        let winners = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        for result in [r1, r2] {
            if let Err(err) = result {
                assert!(matches!(err, GatewayError::OrderNotPending));
            }
        }

        let bids = assert_ok!(fixture.matching.list_bids(order_id).await);
        let accepted = bids.iter().filter(|b| b.status == BidStatus::Accepted).count();
        assert_eq!(accepted, 1);
        assert!(bids.iter().all(|b| b.status != BidStatus::Pending));
    }

    #[tokio::test]
    async fn rejected_driver_may_bid_again() {
        let fixture = make_fixture();
        let order_id = place_order(&fixture, ActorId::new()).await;
        let driver = ActorId::new();

        let _ = assert_ok!(fixture.matching.submit_bid(order_id, driver, 5_000).await);
        let expired = fixture
            .matching
            .expire_stale_bids(chrono::Duration::seconds(-1))
            .await;
        assert_eq!(expired, 1);

        // The earlier bid is rejected, so a fresh one is allowed.
        let result = fixture.matching.submit_bid(order_id, driver, 4_500).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn expiry_skips_fresh_bids() {
        let fixture = make_fixture();
        let order_id = place_order(&fixture, ActorId::new()).await;
        let _ = assert_ok!(
            fixture
                .matching
                .submit_bid(order_id, ActorId::new(), 5_000)
                .await
        );

        let expired = fixture
            .matching
            .expire_stale_bids(chrono::Duration::minutes(10))
            .await;
        assert_eq!(expired, 0);
    }
}
