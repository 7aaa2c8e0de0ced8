//! Order lifecycle handlers: checkout, detail, list, status, cancel, fee.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AdjustFeeRequest, CancelOrderRequest, CreateOrderRequest, CreateOrderResponse,
    OrderListParams, OrderListResponse, PaginationMeta, TransitionRequest,
};
use crate::app_state::AppState;
use crate::domain::order::Coordinates;
use crate::domain::{ActorId, OrderFilter, OrderId};
use crate::error::{ErrorResponse, GatewayError};
use crate::service::CheckoutSpec;

/// `POST /orders` — Check out a cart into a new order.
///
/// Creates the order and all its line items as one atomic unit; a
/// validation failure never leaves a half-created order behind.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for an empty cart or address.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    tag = "Orders",
    summary = "Create an order from a checked-out cart",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = CreateOrderResponse),
        (status = 400, description = "Invalid checkout payload", body = ErrorResponse),
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let spec = CheckoutSpec {
        customer_id: ActorId::from_uuid(req.customer_id),
        store_id: req.store_id,
        items: req.items,
        delivery_address: req.delivery_address,
        delivery_coords: Coordinates {
            latitude: req.latitude,
            longitude: req.longitude,
        },
        notes: req.notes,
        delivery_fee: req.delivery_fee,
    };

    let order = state.order_service.create_order(spec).await?;

    let response = CreateOrderResponse {
        order_id: order.id,
        status: order.status,
        subtotal: order.subtotal,
        delivery_fee: order.delivery_fee,
        total: order.total,
        created_at: order.created_at,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /orders` — List orders with optional customer/driver/status filter.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    tag = "Orders",
    summary = "List orders",
    params(OrderListParams),
    responses(
        (status = 200, description = "Paginated order list", body = OrderListResponse),
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let filter = OrderFilter {
        customer_id: params.customer_id.map(ActorId::from_uuid),
        driver_id: params.driver_id.map(ActorId::from_uuid),
        status: params.status,
    };
    let summaries = state.order_service.list_orders(filter).await;

    let total = summaries.len() as u32;
    let page = params.page.max(1);
    let per_page = params.per_page.clamp(1, 100);
    let total_pages = if total == 0 {
        0
    } else {
        total.div_ceil(per_page)
    };

    // Widened before multiplying: page * per_page can exceed u32.
    let start = usize::try_from(u64::from(page - 1) * u64::from(per_page)).unwrap_or(usize::MAX);
    let data = summaries
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .collect();

    Ok(Json(OrderListResponse {
        data,
        pagination: PaginationMeta {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// `GET /orders/:id` — Full order snapshot including items, bids, and
/// message thread.
///
/// # Errors
///
/// Returns [`GatewayError::OrderNotFound`] if the order does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    tag = "Orders",
    summary = "Get order details",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order snapshot", body = serde_json::Value),
        (status = 404, description = "Order not found", body = ErrorResponse),
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let snapshot = state
        .order_service
        .snapshot(OrderId::from_uuid(id))
        .await?;
    Ok(Json(snapshot))
}

/// `POST /orders/:id/status` — Request a status transition.
///
/// Driver-progress steps require the acting party to be the assigned
/// driver; cancellation requests are routed through the cancellation
/// rules.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidTransition`] for edges not in the
/// lifecycle graph and [`GatewayError::Unauthorized`] for ownership
/// violations.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/status",
    tag = "Orders",
    summary = "Request an order status transition",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
    ),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Transition applied", body = crate::domain::OrderSummary),
        (status = 403, description = "Actor does not own the order", body = ErrorResponse),
        (status = 409, description = "Transition not allowed from current status", body = ErrorResponse),
    )
)]
pub async fn transition_order(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<TransitionRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let summary = state
        .order_service
        .transition_order(
            OrderId::from_uuid(id),
            ActorId::from_uuid(req.actor.actor_id),
            req.actor.role,
            req.status,
        )
        .await?;
    Ok(Json(summary))
}

/// `POST /orders/:id/cancel` — Cancel the order.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] when the actor has no
/// cancellation right in the current status, or
/// [`GatewayError::InvalidTransition`] when the order is already terminal.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/cancel",
    tag = "Orders",
    summary = "Cancel an order",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
    ),
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order cancelled", body = crate::domain::OrderSummary),
        (status = 403, description = "Actor may not cancel now", body = ErrorResponse),
        (status = 409, description = "Order already terminal", body = ErrorResponse),
    )
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<CancelOrderRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let summary = state
        .order_service
        .cancel_order(
            OrderId::from_uuid(id),
            ActorId::from_uuid(req.actor.actor_id),
            req.actor.role,
        )
        .await?;
    Ok(Json(summary))
}

/// `POST /orders/:id/fee` — Adjust the delivery fee while still pending.
///
/// # Errors
///
/// Returns [`GatewayError::OrderNotPending`] once the fee is locked by
/// matching.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/fee",
    tag = "Orders",
    summary = "Adjust the delivery fee of a pending order",
    params(
        ("id" = uuid::Uuid, Path, description = "Order UUID"),
    ),
    request_body = AdjustFeeRequest,
    responses(
        (status = 200, description = "Fee adjusted, total recomputed", body = crate::domain::OrderSummary),
        (status = 409, description = "Order no longer pending", body = ErrorResponse),
    )
)]
pub async fn adjust_fee(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<AdjustFeeRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let summary = state
        .order_service
        .adjust_delivery_fee(
            OrderId::from_uuid(id),
            ActorId::from_uuid(req.actor.actor_id),
            req.actor.role,
            req.delivery_fee,
        )
        .await?;
    Ok(Json(summary))
}

/// Order management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/status", post(transition_order))
        .route("/orders/{id}/cancel", post(cancel_order))
        .route("/orders/{id}/fee", post(adjust_fee))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use axum::body::to_bytes;
    use tokio_test::assert_ok;

    use super::*;
    use crate::config::GatewayConfig;
    use crate::domain::{EventBus, NewOrderItem, OrderRegistry, PresenceTracker};
    use crate::service::{MatchingService, MessageService, OrderService, PresenceService};

    fn make_state() -> AppState {
        let registry = Arc::new(OrderRegistry::new());
        let presence = Arc::new(PresenceTracker::new());
        let bus = EventBus::new(1000);
        let Ok(config) = GatewayConfig::from_env() else {
            panic!("default config failed to load");
        };
        AppState {
            order_service: Arc::new(OrderService::new(
                Arc::clone(&registry),
                Arc::clone(&presence),
                bus.clone(),
            )),
            matching_service: Arc::new(MatchingService::new(
                Arc::clone(&registry),
                Arc::clone(&presence),
                bus.clone(),
            )),
            message_service: Arc::new(MessageService::new(registry, bus.clone())),
            presence_service: Arc::new(PresenceService::new(presence, bus.clone())),
            event_bus: bus,
            config: Arc::new(config),
        }
    }

    fn list_params(page: u32, per_page: u32) -> OrderListParams {
        OrderListParams {
            customer_id: None,
            driver_id: None,
            status: None,
            page,
            per_page,
        }
    }

    async fn checkout(state: &AppState) {
        let spec = CheckoutSpec {
            customer_id: ActorId::new(),
            store_id: uuid::Uuid::new_v4(),
            items: vec![NewOrderItem {
                product_id: uuid::Uuid::new_v4(),
                quantity: 1,
                unit_price: 10_000,
            }],
            delivery_address: "12 Rizal Ave".to_string(),
            delivery_coords: Coordinates {
                latitude: 14.5995,
                longitude: 120.9842,
            },
            notes: None,
            delivery_fee: 5_000,
        };
        let _ = assert_ok!(state.order_service.create_order(spec).await);
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let Ok(bytes) = to_bytes(response.into_body(), usize::MAX).await else {
            panic!("failed to read response body");
        };
        let Ok(body) = serde_json::from_slice(&bytes) else {
            panic!("response body is not json");
        };
        body
    }

    #[tokio::test]
    async fn list_page_far_past_the_end_is_empty() {
        let state = make_state();
        checkout(&state).await;

        // The max page with a full page size must not overflow the start
        // offset; it is simply an empty page.
        let result = list_orders(State(state), Query(list_params(u32::MAX, 100))).await;
        let Ok(response) = result else {
            panic!("list failed");
        };
        let response = response.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let data_len = body.get("data").and_then(|v| v.as_array()).map(Vec::len);
        assert_eq!(data_len, Some(0));
        let total = body
            .get("pagination")
            .and_then(|p| p.get("total"))
            .and_then(serde_json::Value::as_u64);
        assert_eq!(total, Some(1));
    }

    #[tokio::test]
    async fn list_first_page_returns_the_order() {
        let state = make_state();
        checkout(&state).await;

        let result = list_orders(State(state), Query(list_params(1, 20))).await;
        let Ok(response) = result else {
            panic!("list failed");
        };
        let body = body_json(response.into_response()).await;
        let data_len = body.get("data").and_then(|v| v.as_array()).map(Vec::len);
        assert_eq!(data_len, Some(1));
    }
}
