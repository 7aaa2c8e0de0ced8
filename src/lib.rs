//! # courier-gateway
//!
//! REST API and WebSocket gateway coordinating on-demand grocery
//! deliveries between customers and courier drivers.
//!
//! Orders move through a fixed lifecycle (pending, matched, shopping,
//! delivering, delivered) driven by a driver bidding protocol. All
//! state lives in an in-memory registry guarded by per-order locks;
//! every mutation fans out as an event to WebSocket tracking sessions,
//! with an optional PostgreSQL event log and snapshot layer behind it.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── OrderService / MatchingService / MessageService / PresenceService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── OrderRegistry (domain/)
//!     ├── PresenceTracker (domain/)
//!     │
//!     └── PostgreSQL Persistence
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
