//! Persistence layer: PostgreSQL event log and order snapshots.
//!
//! The in-memory registry is authoritative; this layer trails it with
//! an append-only event log and periodic per-order snapshots, and
//! feeds startup restore. The whole layer is switched by
//! `PERSISTENCE_ENABLED`. The concrete implementation uses
//! `sqlx::PgPool` for async PostgreSQL access.

pub mod models;
pub mod postgres;
