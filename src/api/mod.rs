//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All endpoints are mounted under `/api/v1`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "courier-gateway",
        description = "Delivery order coordination API: orders, bids, messages, driver presence."
    ),
    paths(
        handlers::order::create_order,
        handlers::order::list_orders,
        handlers::order::get_order,
        handlers::order::transition_order,
        handlers::order::cancel_order,
        handlers::order::adjust_fee,
        handlers::bid::submit_bid,
        handlers::bid::list_bids,
        handlers::bid::accept_bid,
        handlers::message::post_message,
        handlers::message::list_messages,
        handlers::message::mark_read,
        handlers::presence::update_location,
        handlers::presence::set_availability,
        handlers::presence::get_location,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Orders", description = "Order lifecycle"),
        (name = "Bids", description = "Driver bidding and matching"),
        (name = "Messages", description = "Order-scoped chat"),
        (name = "Presence", description = "Driver location and availability"),
        (name = "System", description = "Health and diagnostics"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}
