//! REST endpoint handlers organized by resource.

pub mod bid;
pub mod message;
pub mod order;
pub mod presence;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(order::routes())
        .merge(bid::routes())
        .merge(message::routes())
        .merge(presence::routes())
}
