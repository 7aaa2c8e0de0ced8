//! Bid handlers: submit, list, and the atomic accept.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{AcceptBidRequest, BidDto, BidListResponse, SubmitBidRequest};
use crate::app_state::AppState;
use crate::domain::{ActorId, BidId, OrderId};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /orders/:id/bids` — Submit a delivery bid on a pending order.
///
/// # Errors
///
/// Returns [`GatewayError::OrderNotPending`] when matching has closed
/// and [`GatewayError::DuplicateBid`] when the driver already has a
/// live bid on this order.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/bids",
    tag = "Bids",
    summary = "Submit a delivery bid",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
    ),
    request_body = SubmitBidRequest,
    responses(
        (status = 201, description = "Bid registered", body = BidDto),
        (status = 409, description = "Order not pending or duplicate bid", body = ErrorResponse),
    )
)]
pub async fn submit_bid(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<SubmitBidRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let bid = state
        .matching_service
        .submit_bid(
            OrderId::from_uuid(id),
            ActorId::from_uuid(req.driver_id),
            req.amount,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(BidDto::from(bid))))
}

/// `GET /orders/:id/bids` — All bids on the order, newest first.
///
/// # Errors
///
/// Returns [`GatewayError::OrderNotFound`] if the order does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/bids",
    tag = "Bids",
    summary = "List bids on an order",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Bid list", body = BidListResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
    )
)]
pub async fn list_bids(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let bids = state.matching_service.list_bids(OrderId::from_uuid(id)).await?;
    Ok(Json(BidListResponse {
        data: bids.into_iter().map(BidDto::from).collect(),
    }))
}

/// `POST /orders/:id/bids/:bid_id/accept` — Accept one bid and reject
/// every other pending bid in the same atomic step.
///
/// The winning driver is assigned and the order moves to `matched`.
/// Two concurrent accepts can never both succeed; the loser observes
/// [`GatewayError::OrderNotPending`].
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] if the caller is not the
/// order's customer and [`GatewayError::BidNotPending`] if the bid was
/// already resolved.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/bids/{bid_id}/accept",
    tag = "Bids",
    summary = "Accept a bid and match the order",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
        ("bid_id" = uuid::Uuid, Path, description = "Bid UUID"),
    ),
    request_body = AcceptBidRequest,
    responses(
        (status = 200, description = "Bid accepted, order matched", body = BidDto),
        (status = 403, description = "Caller is not the order's customer", body = ErrorResponse),
        (status = 409, description = "Order or bid no longer pending", body = ErrorResponse),
    )
)]
pub async fn accept_bid(
    State(state): State<AppState>,
    Path((id, bid_id)): Path<(uuid::Uuid, uuid::Uuid)>,
    Json(req): Json<AcceptBidRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let bid = state
        .matching_service
        .accept_bid(
            OrderId::from_uuid(id),
            BidId::from_uuid(bid_id),
            ActorId::from_uuid(req.customer_id),
        )
        .await?;
    Ok(Json(BidDto::from(bid)))
}

/// Bid matching routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders/{id}/bids", post(submit_bid).get(list_bids))
        .route("/orders/{id}/bids/{bid_id}/accept", post(accept_bid))
}
