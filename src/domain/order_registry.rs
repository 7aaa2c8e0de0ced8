//! Concurrent order storage with per-order fine-grained locking.
//!
//! [`OrderRegistry`] stores all orders in a `HashMap` where each entry is
//! individually protected by a [`tokio::sync::RwLock`]. This allows
//! concurrent reads on the same order and concurrent writes on different
//! orders, while writes to the same order (competing `accept_bid` calls,
//! status transitions) are serialized by the per-entry lock.
//!
//! Orders are never removed: terminal statuses (delivered, cancelled) end
//! the lifecycle but the record stays readable.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::OrderId;
use super::ids::ActorId;
use super::order::{OrderEntry, OrderStatus, OrderSummary};
use crate::error::GatewayError;

/// Filter for order list queries. All set fields must match.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    /// Restrict to orders placed by this customer.
    pub customer_id: Option<ActorId>,
    /// Restrict to orders assigned to this driver.
    pub driver_id: Option<ActorId>,
    /// Restrict to orders in this status (e.g. `Pending` for the driver
    /// "available orders" view).
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    fn matches(&self, entry: &OrderEntry) -> bool {
        if let Some(customer) = self.customer_id
            && entry.order.customer_id != customer
        {
            return false;
        }
        if let Some(driver) = self.driver_id
            && entry.order.driver_id != Some(driver)
        {
            return false;
        }
        if let Some(status) = self.status
            && entry.order.status != status
        {
            return false;
        }
        true
    }
}

/// Central store for all orders, the canonical owner of the status field.
///
/// Uses a `RwLock<HashMap<...>>` for the outer map and per-entry
/// `Arc<RwLock<OrderEntry>>` for fine-grained per-order locking.
///
/// # Concurrency
///
/// - Multiple tasks may read the same order concurrently.
/// - Writes to different orders are concurrent.
/// - Writes to the same order are serialized.
#[derive(Debug)]
pub struct OrderRegistry {
    orders: RwLock<HashMap<OrderId, Arc<RwLock<OrderEntry>>>>,
}

impl OrderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a freshly created order entry into the registry.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if an order with the same ID
    /// already exists (should never happen with UUID v4).
    pub async fn insert(&self, entry: OrderEntry) -> Result<OrderId, GatewayError> {
        let order_id = entry.order.id;
        let mut map = self.orders.write().await;
        if map.contains_key(&order_id) {
            return Err(GatewayError::Internal(format!(
                "order {order_id} already exists"
            )));
        }
        map.insert(order_id, Arc::new(RwLock::new(entry)));
        Ok(order_id)
    }

    /// Returns a shared reference to the order entry behind its per-order
    /// lock.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::OrderNotFound`] if no order with the given
    /// ID exists.
    pub async fn get(&self, order_id: OrderId) -> Result<Arc<RwLock<OrderEntry>>, GatewayError> {
        let map = self.orders.read().await;
        map.get(&order_id)
            .cloned()
            .ok_or(GatewayError::OrderNotFound(*order_id.as_uuid()))
    }

    /// Returns summaries of all orders matching the filter, newest first.
    pub async fn list(&self, filter: OrderFilter) -> Vec<OrderSummary> {
        let map = self.orders.read().await;
        let mut summaries = Vec::with_capacity(map.len());
        for entry_lock in map.values() {
            let entry = entry_lock.read().await;
            if filter.matches(&entry) {
                summaries.push(OrderSummary::from(&*entry));
            }
        }
        drop(map);
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    /// Returns the entry locks of all orders matching the filter.
    ///
    /// Used by the bid-expiry sweep, which needs write access to each
    /// matching order without holding the outer map lock while mutating.
    pub async fn collect(&self, filter: OrderFilter) -> Vec<Arc<RwLock<OrderEntry>>> {
        let map = self.orders.read().await;
        let mut entries = Vec::new();
        for entry_lock in map.values() {
            let matched = {
                let entry = entry_lock.read().await;
                filter.matches(&entry)
            };
            if matched {
                entries.push(Arc::clone(entry_lock));
            }
        }
        entries
    }

    /// Returns the number of orders in the registry.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Returns `true` if the registry contains no orders.
    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

impl Default for OrderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
