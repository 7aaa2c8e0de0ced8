//! Domain layer: core types, order registry, presence, and event system.
//!
//! This module contains the server-side domain model: typed identifiers,
//! the order aggregate with its status state machine, delivery bids, chat
//! messages, driver presence, the event bus for broadcasting state
//! changes, and the order registry for concurrent storage.

pub mod bid;
pub mod event;
pub mod event_bus;
pub mod ids;
pub mod message;
pub mod order;
pub mod order_registry;
pub mod presence;

pub use bid::{BidStatus, DeliveryBid};
pub use event::DeliveryEvent;
pub use event_bus::EventBus;
pub use ids::{ActorId, ActorRole, BidId, MessageId, OrderId};
pub use message::Message;
pub use order::{
    Coordinates, NewOrderItem, Order, OrderEntry, OrderItem, OrderSnapshot, OrderStatus,
    OrderSummary,
};
pub use order_registry::{OrderFilter, OrderRegistry};
pub use presence::{DriverLocation, PresenceTracker};
