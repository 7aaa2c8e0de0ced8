//! PostgreSQL implementation of the persistence layer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{OrderSnapshotRow, StoredEvent};
use crate::domain::DeliveryEvent;
use crate::error::GatewayError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends a delivery event to the event log.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn save_event(&self, event: &DeliveryEvent) -> Result<i64, GatewayError> {
        let payload = serde_json::to_value(event)
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (order_id, driver_id, event_type, payload) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(event.order_id().map(|id| *id.as_uuid()))
        .bind(event.driver_id().map(|id| *id.as_uuid()))
        .bind(event.event_type_str())
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(row)
    }

    /// Saves an order state snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn save_order_snapshot(
        &self,
        order_id: Uuid,
        status: &str,
        state_json: &serde_json::Value,
        version: u64,
    ) -> Result<i64, GatewayError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO order_snapshots (order_id, status, state_json, version) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(order_id)
        .bind(status)
        .bind(state_json)
        .bind(i64::try_from(version).unwrap_or(i64::MAX))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(row)
    }

    /// Loads the latest snapshot for each order using `DISTINCT ON`.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn load_latest_snapshots(&self) -> Result<Vec<OrderSnapshotRow>, GatewayError> {
        let rows = sqlx::query_as::<_, (i64, Uuid, String, serde_json::Value, i64, DateTime<Utc>)>(
            "SELECT DISTINCT ON (order_id) id, order_id, status, state_json, version, snapshot_at \
             FROM order_snapshots ORDER BY order_id, snapshot_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, order_id, status, state_json, version, snapshot_at)| OrderSnapshotRow {
                    id,
                    order_id,
                    status,
                    state_json,
                    version,
                    snapshot_at,
                },
            )
            .collect())
    }

    /// Loads events after the given timestamp, optionally filtered by order ID.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn load_events_after(
        &self,
        after: DateTime<Utc>,
        order_id: Option<Uuid>,
    ) -> Result<Vec<StoredEvent>, GatewayError> {
        let rows = if let Some(oid) = order_id {
            sqlx::query_as::<_, (i64, Option<Uuid>, Option<Uuid>, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, order_id, driver_id, event_type, payload, created_at FROM events \
                 WHERE created_at > $1 AND order_id = $2 ORDER BY created_at ASC",
            )
            .bind(after)
            .bind(oid)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, (i64, Option<Uuid>, Option<Uuid>, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, order_id, driver_id, event_type, payload, created_at FROM events \
                 WHERE created_at > $1 ORDER BY created_at ASC",
            )
            .bind(after)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, order_id, driver_id, event_type, payload, created_at)| StoredEvent {
                    id,
                    order_id,
                    driver_id,
                    event_type,
                    payload,
                    created_at,
                },
            )
            .collect())
    }

    /// Deletes snapshots older than the given number of days.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn delete_old_snapshots(&self, before_days: u64) -> Result<u64, GatewayError> {
        let cutoff =
            Utc::now() - chrono::Duration::days(i64::try_from(before_days).unwrap_or(i64::MAX));

        let result = sqlx::query("DELETE FROM order_snapshots WHERE snapshot_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
