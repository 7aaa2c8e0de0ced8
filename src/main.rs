//! courier-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints,
//! restores state from PostgreSQL when persistence is enabled, and
//! spawns the background tasks (event log, snapshots, bid expiry).

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use courier_gateway::api;
use courier_gateway::app_state::AppState;
use courier_gateway::config::GatewayConfig;
use courier_gateway::domain::{
    EventBus, OrderEntry, OrderFilter, OrderRegistry, OrderSnapshot, PresenceTracker,
};
use courier_gateway::persistence::postgres::PostgresPersistence;
use courier_gateway::service::{MatchingService, MessageService, OrderService, PresenceService};
use courier_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Arc::new(GatewayConfig::from_env()?);
    tracing::info!(addr = %config.listen_addr, "starting courier-gateway");

    // Build domain layer
    let registry = Arc::new(OrderRegistry::new());
    let presence = Arc::new(PresenceTracker::new());
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Optional persistence: restore state, then trail the bus
    let persistence = if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        sqlx::migrate!().run(&pool).await?;
        let layer = PostgresPersistence::new(pool);
        restore_state(&layer, &registry, &presence).await?;
        Some(layer)
    } else {
        None
    };

    // Build service layer
    let order_service = Arc::new(OrderService::new(
        Arc::clone(&registry),
        Arc::clone(&presence),
        event_bus.clone(),
    ));
    let matching_service = Arc::new(MatchingService::new(
        Arc::clone(&registry),
        Arc::clone(&presence),
        event_bus.clone(),
    ));
    let message_service = Arc::new(MessageService::new(
        Arc::clone(&registry),
        event_bus.clone(),
    ));
    let presence_service = Arc::new(PresenceService::new(
        Arc::clone(&presence),
        event_bus.clone(),
    ));

    if let Some(layer) = persistence {
        if config.event_log_enabled {
            spawn_event_log_task(layer.clone(), event_bus.clone());
        }
        if config.snapshot_interval_secs > 0 {
            spawn_snapshot_task(layer, Arc::clone(&registry), Arc::clone(&config));
        }
    }
    if config.bid_expiry_secs > 0 {
        spawn_bid_expiry_task(Arc::clone(&matching_service), config.bid_expiry_secs);
    }

    // Build application state
    let app_state = AppState {
        order_service,
        matching_service,
        message_service,
        presence_service,
        event_bus,
        config: Arc::clone(&config),
    };

    // Build router
    // The timeout covers REST only; /ws is long-lived and exempt.
    let app = Router::new()
        .merge(api::build_router().layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        ))))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    #[cfg(feature = "swagger-ui")]
    let app = app.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", <api::ApiDoc as utoipa::OpenApi>::openapi()),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Repopulates the registry and the driver assignment index from the
/// latest stored snapshots.
async fn restore_state(
    layer: &PostgresPersistence,
    registry: &Arc<OrderRegistry>,
    presence: &Arc<PresenceTracker>,
) -> anyhow::Result<()> {
    let rows = layer.load_latest_snapshots().await?;
    let mut restored = 0usize;
    let mut newest = None;

    for row in rows {
        let snapshot: OrderSnapshot = match serde_json::from_value(row.state_json) {
            Ok(s) => s,
            Err(err) => {
                tracing::error!(order_id = %row.order_id, %err, "skipping unreadable snapshot");
                continue;
            }
        };
        let entry = OrderEntry::from_snapshot(snapshot);
        let status = entry.order.status;
        let driver_id = entry.order.driver_id;
        let order_id = registry.insert(entry).await?;

        // Re-link the driver so messaging and release keep working.
        if status.is_active_assignment()
            && let Some(driver) = driver_id
        {
            presence.assign(driver, order_id).await;
        }

        restored += 1;
        if newest.is_none_or(|t| row.snapshot_at > t) {
            newest = Some(row.snapshot_at);
        }
    }

    if let Some(after) = newest {
        // Events past the newest snapshot were not captured by any
        // snapshot yet; surface how much recent history is log-only.
        let trailing = layer.load_events_after(after, None).await?;
        if !trailing.is_empty() {
            tracing::warn!(
                count = trailing.len(),
                "event log has entries newer than the latest snapshot; \
                 changes since then are not reflected in restored state"
            );
        }
    }

    tracing::info!(restored, "state restore complete");
    Ok(())
}

/// Appends every published event to the PostgreSQL event log.
fn spawn_event_log_task(layer: PostgresPersistence, event_bus: EventBus) {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(err) = layer.save_event(&event).await {
                        tracing::error!(%err, "failed to append event to log");
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event log task lagged behind event bus");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Periodically snapshots every order and prunes old snapshots.
fn spawn_snapshot_task(
    layer: PostgresPersistence,
    registry: Arc<OrderRegistry>,
    config: Arc<GatewayConfig>,
) {
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(config.snapshot_interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;

            for entry_lock in registry.collect(OrderFilter::default()).await {
                let snapshot = {
                    let entry = entry_lock.read().await;
                    OrderSnapshot::from(&*entry)
                };
                let state_json = match serde_json::to_value(&snapshot) {
                    Ok(v) => v,
                    Err(err) => {
                        tracing::error!(%err, "failed to serialize order snapshot");
                        continue;
                    }
                };
                if let Err(err) = layer
                    .save_order_snapshot(
                        *snapshot.order.id.as_uuid(),
                        snapshot.order.status.as_str(),
                        &state_json,
                        snapshot.version,
                    )
                    .await
                {
                    tracing::error!(order_id = %snapshot.order.id, %err, "failed to save snapshot");
                }
            }

            if config.cleanup_after_days > 0 {
                match layer.delete_old_snapshots(config.cleanup_after_days).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::debug!(deleted, "pruned old snapshots");
                    }
                    Ok(_) => {}
                    Err(err) => tracing::error!(%err, "snapshot cleanup failed"),
                }
            }
        }
    });
}

/// Auto-rejects pending bids that outlived the configured expiry.
fn spawn_bid_expiry_task(matching_service: Arc<MatchingService>, expiry_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(expiry_secs.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let max_age = chrono::Duration::seconds(i64::try_from(expiry_secs).unwrap_or(i64::MAX));
        loop {
            ticker.tick().await;
            let expired = matching_service.expire_stale_bids(max_age).await;
            if expired > 0 {
                tracing::info!(expired, "auto-rejected stale bids");
            }
        }
    });
}
