//! Order service: checkout, status transitions, cancellation, and fee
//! adjustment.
//!
//! Every mutation method follows the same pattern: acquire the per-order
//! write lock, validate authorization and the transition graph, apply the
//! change, then publish the resulting events while still inside the
//! critical section so that per-order event ordering matches mutation
//! order. The event is on the bus before the call returns.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::order::{Coordinates, NewOrderItem, Order, OrderItem, OrderSnapshot};
use crate::domain::{
    ActorId, ActorRole, BidStatus, DeliveryEvent, EventBus, OrderEntry, OrderFilter, OrderId,
    OrderRegistry, OrderStatus, OrderSummary, PresenceTracker,
};
use crate::error::GatewayError;

/// Checkout input produced by the (external) cart.
#[derive(Debug, Clone)]
pub struct CheckoutSpec {
    /// The customer placing the order.
    pub customer_id: ActorId,
    /// The store the items come from.
    pub store_id: uuid::Uuid,
    /// Line items with catalog prices frozen by the cart.
    pub items: Vec<NewOrderItem>,
    /// Free-form delivery address.
    pub delivery_address: String,
    /// Delivery destination coordinates.
    pub delivery_coords: Coordinates,
    /// Optional notes for the driver.
    pub notes: Option<String>,
    /// Initial delivery fee in cents.
    pub delivery_fee: u64,
}

/// Orchestration layer for order lifecycle operations.
#[derive(Debug, Clone)]
pub struct OrderService {
    registry: Arc<OrderRegistry>,
    presence: Arc<PresenceTracker>,
    event_bus: EventBus,
}

impl OrderService {
    /// Creates a new `OrderService`.
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

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`OrderRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<OrderRegistry> {
        &self.registry
    }

    /// Creates an order and all its line items as one atomic unit.
    ///
    /// Line subtotals and the order total are computed here and frozen;
    /// later catalog price changes never alter the stored items.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for an empty cart, a zero
    /// quantity, or an empty delivery address. No partial order is ever
    /// visible: validation happens before the single registry insert.
    pub async fn create_order(&self, spec: CheckoutSpec) -> Result<Order, GatewayError> {
        if spec.items.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "order must contain at least one item".to_string(),
            ));
        }
        if spec.delivery_address.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "delivery address must not be empty".to_string(),
            ));
        }

        let mut items = Vec::with_capacity(spec.items.len());
        let mut subtotal: u64 = 0;
        for item in &spec.items {
            if item.quantity == 0 {
                return Err(GatewayError::InvalidRequest(format!(
                    "zero quantity for product {}",
                    item.product_id
                )));
            }
            let line = item.unit_price.saturating_mul(u64::from(item.quantity));
            subtotal = subtotal.saturating_add(line);
            items.push(OrderItem {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                subtotal: line,
            });
        }

        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            customer_id: spec.customer_id,
            driver_id: None,
            store_id: spec.store_id,
            status: OrderStatus::Pending,
            subtotal,
            delivery_fee: spec.delivery_fee,
            total: subtotal.saturating_add(spec.delivery_fee),
            delivery_address: spec.delivery_address,
            delivery_coords: spec.delivery_coords,
            notes: spec.notes,
            created_at: now,
            updated_at: now,
        };

        let entry = OrderEntry::new(order.clone(), items);
        let version = entry.version;
        self.registry.insert(entry).await?;

        let _ = self.event_bus.publish(DeliveryEvent::OrderCreated {
            order_id: order.id,
            customer_id: order.customer_id,
            store_id: order.store_id,
            total: order.total,
            version,
            timestamp: now,
        });

        tracing::info!(order_id = %order.id, total = order.total, "order created");
        Ok(order)
    }

    /// Returns a point-in-time snapshot of the order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::OrderNotFound`] for an unknown id.
    pub async fn snapshot(&self, order_id: OrderId) -> Result<OrderSnapshot, GatewayError> {
        let entry_lock = self.registry.get(order_id).await?;
        let entry = entry_lock.read().await;
        Ok(OrderSnapshot::from(&*entry))
    }

    /// Returns summaries of all orders matching the filter, newest first.
    pub async fn list_orders(&self, filter: OrderFilter) -> Vec<OrderSummary> {
        self.registry.list(filter).await
    }

    /// Applies a driver-progress status transition
    /// (`matched → shopping → delivering → delivered`).
    ///
    /// Cancellation requests are delegated to [`Self::cancel_order`];
    /// `matched` cannot be requested directly, it is reached only through
    /// bid acceptance.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Unauthorized`] unless the actor is the assigned
    ///   driver.
    /// - [`GatewayError::InvalidTransition`] when the edge is not in the
    ///   graph; the status is left unchanged.
    pub async fn transition_order(
        &self,
        order_id: OrderId,
        actor: ActorId,
        role: ActorRole,
        to: OrderStatus,
    ) -> Result<OrderSummary, GatewayError> {
        match to {
            OrderStatus::Cancelled => return self.cancel_order(order_id, actor, role).await,
            OrderStatus::Pending | OrderStatus::Matched => {
                return Err(GatewayError::InvalidRequest(format!(
                    "status {to} cannot be requested directly"
                )));
            }
            OrderStatus::Shopping | OrderStatus::Delivering | OrderStatus::Delivered => {}
        }

        let entry_lock = self.registry.get(order_id).await?;
        let mut entry = entry_lock.write().await;

        if entry.order.driver_id != Some(actor) {
            return Err(GatewayError::Unauthorized {
                actor: *actor.as_uuid(),
                action: format!("advance order {order_id} to {to}"),
            });
        }

        let previous = entry.order.status;
        let version = entry.transition(to)?;

        if to == OrderStatus::Delivered {
            self.presence.release(actor).await;
        }

        let summary = OrderSummary::from(&*entry);
        self.publish_status_change(&entry, previous, version);
        if to == OrderStatus::Delivered {
            let _ = self.event_bus.publish(DeliveryEvent::AvailabilityChanged {
                driver_id: actor,
                available: true,
                timestamp: Utc::now(),
            });
        }
        drop(entry);

        tracing::info!(%order_id, %previous, status = %to, "order transitioned");
        Ok(summary)
    }

    /// Cancels the order, auto-rejecting any still-pending bids and
    /// releasing the assigned driver.
    ///
    /// Customers may cancel only while the order is pending or matched;
    /// the assigned driver or an operator may cancel from any
    /// non-terminal state.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Unauthorized`] when the actor has no cancellation
    ///   right in the current status.
    /// - [`GatewayError::InvalidTransition`] when the order is already
    ///   terminal.
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        actor: ActorId,
        role: ActorRole,
    ) -> Result<OrderSummary, GatewayError> {
        let entry_lock = self.registry.get(order_id).await?;
        let mut entry = entry_lock.write().await;

        let status = entry.order.status;
        let allowed = match role {
            ActorRole::Customer => {
                entry.order.customer_id == actor
                    && matches!(status, OrderStatus::Pending | OrderStatus::Matched)
            }
            ActorRole::Driver => entry.order.driver_id == Some(actor),
            ActorRole::Operator => true,
        };
        if !allowed && !status.is_terminal() {
            return Err(GatewayError::Unauthorized {
                actor: *actor.as_uuid(),
                action: format!("cancel order {order_id}"),
            });
        }

        let previous = entry.order.status;
        let version = entry.transition(OrderStatus::Cancelled)?;

        // Outstanding bids are orphaned by cancellation; reject them so
        // bidders stop expecting assignment.
        let mut rejected = Vec::new();
        for bid in &mut entry.bids {
            if bid.status == BidStatus::Pending {
                bid.status = BidStatus::Rejected;
                rejected.push((bid.id, bid.driver_id));
            }
        }

        let driver = entry.order.driver_id;
        if let Some(driver_id) = driver {
            self.presence.release(driver_id).await;
        }

        let summary = OrderSummary::from(&*entry);
        for (bid_id, driver_id) in rejected {
            let _ = self.event_bus.publish(DeliveryEvent::BidResolved {
                order_id,
                bid_id,
                driver_id,
                status: BidStatus::Rejected,
                version,
                timestamp: Utc::now(),
            });
        }
        self.publish_status_change(&entry, previous, version);
        if let Some(driver_id) = driver {
            let _ = self.event_bus.publish(DeliveryEvent::AvailabilityChanged {
                driver_id,
                available: true,
                timestamp: Utc::now(),
            });
        }
        drop(entry);

        tracing::info!(%order_id, %previous, "order cancelled");
        Ok(summary)
    }

    /// Adjusts the delivery fee while the order is still pending and
    /// recomputes the total.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::OrderNotPending`] once the order left the pending
    ///   state (the fee is locked at matching).
    /// - [`GatewayError::Unauthorized`] unless the actor is the owning
    ///   customer or an operator.
    pub async fn adjust_delivery_fee(
        &self,
        order_id: OrderId,
        actor: ActorId,
        role: ActorRole,
        delivery_fee: u64,
    ) -> Result<OrderSummary, GatewayError> {
        let entry_lock = self.registry.get(order_id).await?;
        let mut entry = entry_lock.write().await;

        if entry.order.status != OrderStatus::Pending {
            return Err(GatewayError::OrderNotPending);
        }
        let allowed = match role {
            ActorRole::Customer => entry.order.customer_id == actor,
            ActorRole::Operator => true,
            ActorRole::Driver => false,
        };
        if !allowed {
            return Err(GatewayError::Unauthorized {
                actor: *actor.as_uuid(),
                action: format!("adjust fee of order {order_id}"),
            });
        }

        entry.order.delivery_fee = delivery_fee;
        entry.order.recompute_total();
        let version = entry.touch();

        let summary = OrderSummary::from(&*entry);
        let _ = self.event_bus.publish(DeliveryEvent::DeliveryFeeUpdated {
            order_id,
            delivery_fee,
            total: entry.order.total,
            version,
            timestamp: Utc::now(),
        });
        drop(entry);

        Ok(summary)
    }

    fn publish_status_change(&self, entry: &OrderEntry, previous: OrderStatus, version: u64) {
        let _ = self.event_bus.publish(DeliveryEvent::OrderStatusChanged {
            order_id: entry.order.id,
            previous,
            status: entry.order.status,
            driver_id: entry.order.driver_id,
            version,
            timestamp: Utc::now(),
        });
    }
}
