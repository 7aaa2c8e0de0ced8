//! Driver presence handlers: location pings and availability.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::put;
use axum::{Json, Router};

use crate::api::dto::{LocationResponse, SetAvailabilityRequest, UpdateLocationRequest};
use crate::app_state::AppState;
use crate::domain::order::Coordinates;
use crate::domain::ActorId;
use crate::error::{ErrorResponse, GatewayError};

/// `PUT /drivers/:id/location` — Record a position ping.
///
/// First ping implicitly registers the driver as available. If the
/// driver is on an active delivery, the resulting event is scoped to
/// that order so trackers can filter on it.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    put,
    path = "/api/v1/drivers/{id}/location",
    tag = "Presence",
    summary = "Update a driver's location",
    params(
        ("id" = uuid::Uuid, Path, description = "Driver UUID"),
    ),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Location recorded", body = LocationResponse),
    )
)]
pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateLocationRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let location = state
        .presence_service
        .update_location(
            ActorId::from_uuid(id),
            Coordinates {
                latitude: req.latitude,
                longitude: req.longitude,
            },
        )
        .await;
    Ok(Json(LocationResponse::from_location(
        location,
        state.config.location_stale_secs,
    )))
}

/// `PUT /drivers/:id/availability` — Flip the driver's availability flag.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    put,
    path = "/api/v1/drivers/{id}/availability",
    tag = "Presence",
    summary = "Set a driver's availability",
    params(
        ("id" = uuid::Uuid, Path, description = "Driver UUID"),
    ),
    request_body = SetAvailabilityRequest,
    responses(
        (status = 204, description = "Availability updated"),
    )
)]
pub async fn set_availability(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<SetAvailabilityRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    state
        .presence_service
        .set_availability(ActorId::from_uuid(id), req.available)
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /drivers/:id/location` — Last known position of a driver.
///
/// # Errors
///
/// Returns [`GatewayError::DriverNotFound`] if the driver never pinged.
#[utoipa::path(
    get,
    path = "/api/v1/drivers/{id}/location",
    tag = "Presence",
    summary = "Get a driver's last known location",
    params(
        ("id" = uuid::Uuid, Path, description = "Driver UUID"),
    ),
    responses(
        (status = 200, description = "Last known location", body = LocationResponse),
        (status = 404, description = "Driver has no presence record", body = ErrorResponse),
    )
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let location = state
        .presence_service
        .get_location(ActorId::from_uuid(id))
        .await?;
    Ok(Json(LocationResponse::from_location(
        location,
        state.config.location_stale_secs,
    )))
}

/// Driver presence routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/drivers/{id}/location",
            put(update_location).get(get_location),
        )
        .route("/drivers/{id}/availability", put(set_availability))
}
