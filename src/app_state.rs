//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::domain::EventBus;
use crate::service::{MatchingService, MessageService, OrderService, PresenceService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Order lifecycle operations.
    pub order_service: Arc<OrderService>,
    /// Bid submission and acceptance.
    pub matching_service: Arc<MatchingService>,
    /// Order-scoped chat.
    pub message_service: Arc<MessageService>,
    /// Driver location and availability.
    pub presence_service: Arc<PresenceService>,
    /// Event bus for tracking-session subscriptions.
    pub event_bus: EventBus,
    /// Deployment configuration (staleness hints, expiry policy).
    pub config: Arc<GatewayConfig>,
}
