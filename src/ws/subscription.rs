//! Per-connection subscription manager.
//!
//! Tracks which orders and drivers a WebSocket client is subscribed to
//! and provides server-side event filtering.

use std::collections::HashSet;

use crate::domain::{ActorId, DeliveryEvent, OrderId};

/// Manages the subscription set for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed order IDs. If `subscribe_all` is true, this set is ignored.
    order_ids: HashSet<OrderId>,
    /// Subscribed driver IDs, for presence events.
    driver_ids: HashSet<ActorId>,
    /// Whether the client subscribes to all events (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds order and driver IDs to the subscription set. `wildcard`
    /// enables the match-everything filter.
    pub fn subscribe(&mut self, orders: &[OrderId], drivers: &[ActorId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        for id in orders {
            self.order_ids.insert(*id);
        }
        for id in drivers {
            self.driver_ids.insert(*id);
        }
    }

    /// Removes order and driver IDs from the subscription set.
    pub fn unsubscribe(&mut self, orders: &[OrderId], drivers: &[ActorId]) {
        for id in orders {
            self.order_ids.remove(id);
        }
        for id in drivers {
            self.driver_ids.remove(id);
        }
    }

    /// Returns `true` if the event matches the subscription filter.
    ///
    /// An event passes when its order is subscribed, or its driver is
    /// subscribed, or the wildcard is active.
    #[must_use]
    pub fn matches(&self, event: &DeliveryEvent) -> bool {
        if self.subscribe_all {
            return true;
        }
        if let Some(order_id) = event.order_id()
            && self.order_ids.contains(&order_id)
        {
            return true;
        }
        if let Some(driver_id) = event.driver_id()
            && self.driver_ids.contains(&driver_id)
        {
            return true;
        }
        false
    }

    /// Returns the number of explicitly subscribed orders and drivers.
    #[must_use]
    pub fn count(&self) -> usize {
        self.order_ids.len() + self.driver_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
