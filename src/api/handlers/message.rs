//! Message thread handlers for customer/driver coordination.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{MarkReadRequest, MessageDto, MessageListResponse, PostMessageRequest};
use crate::app_state::AppState;
use crate::domain::{ActorId, MessageId, OrderId};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /orders/:id/messages` — Post a message into the order thread.
///
/// Only the two participants of an active delivery may post.
///
/// # Errors
///
/// Returns [`GatewayError::OrderNotActive`] while no driver is assigned
/// and [`GatewayError::Unauthorized`] for non-participants.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/messages",
    tag = "Messages",
    summary = "Post a message to the order thread",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
    ),
    request_body = PostMessageRequest,
    responses(
        (status = 201, description = "Message posted", body = MessageDto),
        (status = 403, description = "Sender is not a participant", body = ErrorResponse),
        (status = 409, description = "Order has no assigned driver", body = ErrorResponse),
    )
)]
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<PostMessageRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let message = state
        .message_service
        .post_message(
            OrderId::from_uuid(id),
            ActorId::from_uuid(req.sender_id),
            req.content,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(MessageDto::from(message))))
}

/// `GET /orders/:id/messages` — The full thread in posting order.
///
/// # Errors
///
/// Returns [`GatewayError::OrderNotFound`] if the order does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/messages",
    tag = "Messages",
    summary = "List the order's message thread",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Message thread", body = MessageListResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let messages = state.message_service.history(OrderId::from_uuid(id)).await?;
    Ok(Json(MessageListResponse {
        data: messages.into_iter().map(MessageDto::from).collect(),
    }))
}

/// `POST /orders/:id/messages/:message_id/read` — Mark a message read.
///
/// Idempotent; re-reading an already-read message is a no-op.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] when the reader is the sender
/// or not a participant.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/messages/{message_id}/read",
    tag = "Messages",
    summary = "Mark a message as read",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
        ("message_id" = uuid::Uuid, Path, description = "Message UUID"),
    ),
    request_body = MarkReadRequest,
    responses(
        (status = 204, description = "Marked read (or already read)"),
        (status = 403, description = "Reader may not mark this message", body = ErrorResponse),
        (status = 404, description = "Order or message not found", body = ErrorResponse),
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    Path((id, message_id)): Path<(uuid::Uuid, uuid::Uuid)>,
    Json(req): Json<MarkReadRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    state
        .message_service
        .mark_read(
            OrderId::from_uuid(id),
            MessageId::from_uuid(message_id),
            ActorId::from_uuid(req.reader_id),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Message thread routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders/{id}/messages", post(post_message).get(list_messages))
        .route("/orders/{id}/messages/{message_id}/read", post(mark_read))
}
