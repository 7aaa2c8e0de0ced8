//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` carries tracking sessions: clients
//! subscribe to orders or drivers and receive the resulting event
//! stream, with a `snapshot` command for catching up after a reconnect.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
