//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection:
//! dispatches incoming commands and forwards filtered events. Events
//! reach every connection in publish order, so a client that replays
//! its subscription after a `snapshot` command never observes an order
//! going backwards.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::app_state::AppState;
use crate::domain::{ActorId, DeliveryEvent, OrderId};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<DeliveryEvent>,
    state: AppState,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &state).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Event from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(delivery_event) => {
                        if subs.matches(&delivery_event) {
                            let msg = WsMessage {
                                id: uuid::Uuid::new_v4().to_string(),
                                msg_type: WsMessageType::Event,
                                timestamp: chrono::Utc::now(),
                                payload: serde_json::to_value(&delivery_event).unwrap_or_default(),
                            };
                            let json = serde_json::to_string(&msg).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Handles a text message from the client, returning an optional JSON response.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    state: &AppState,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return error_response(String::new(), 400, "malformed JSON");
    };

    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload.clone()) else {
        return error_response(msg.id, 404, "unknown command");
    };

    match command {
        WsCommand::Subscribe {
            order_ids,
            driver_ids,
        } => {
            let (orders, wildcard) = parse_order_ids(&order_ids);
            let drivers = parse_driver_ids(&driver_ids);
            subs.subscribe(&orders, &drivers, wildcard);
            let response = WsMessage {
                id: msg.id,
                msg_type: WsMessageType::Response,
                timestamp: chrono::Utc::now(),
                payload: serde_json::json!({
                    "subscribed_orders": orders.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
                    "subscribed_drivers": drivers.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            };
            serde_json::to_string(&response).ok()
        }
        WsCommand::Unsubscribe {
            order_ids,
            driver_ids,
        } => {
            let (orders, _) = parse_order_ids(&order_ids);
            let drivers = parse_driver_ids(&driver_ids);
            subs.unsubscribe(&orders, &drivers);
            let response = WsMessage {
                id: msg.id,
                msg_type: WsMessageType::Response,
                timestamp: chrono::Utc::now(),
                payload: serde_json::json!({
                    "remaining_count": subs.count(),
                }),
            };
            serde_json::to_string(&response).ok()
        }
        WsCommand::Snapshot { order_id } => {
            let Ok(uuid) = order_id.parse::<uuid::Uuid>() else {
                return error_response(msg.id, 400, "invalid order id");
            };
            match state.order_service.snapshot(OrderId::from_uuid(uuid)).await {
                Ok(snapshot) => {
                    // Pair the order state with the assigned driver's last
                    // known position so a late joiner can render immediately.
                    let driver_location = match snapshot.order.driver_id {
                        Some(driver_id) => state
                            .presence_service
                            .get_location(driver_id)
                            .await
                            .ok()
                            .and_then(|loc| serde_json::to_value(loc).ok()),
                        None => None,
                    };
                    let response = WsMessage {
                        id: msg.id,
                        msg_type: WsMessageType::Response,
                        timestamp: chrono::Utc::now(),
                        payload: serde_json::json!({
                            "snapshot": serde_json::to_value(&snapshot).unwrap_or_default(),
                            "driver_location": driver_location,
                        }),
                    };
                    serde_json::to_string(&response).ok()
                }
                Err(err) => error_response(msg.id, err.error_code(), &err.to_string()),
            }
        }
    }
}

fn error_response(id: String, code: u32, message: &str) -> Option<String> {
    let err = WsMessage {
        id,
        msg_type: WsMessageType::Error,
        timestamp: chrono::Utc::now(),
        payload: serde_json::json!({
            "code": code,
            "message": message,
        }),
    };
    serde_json::to_string(&err).ok()
}

/// Parses order ID strings, recognizing the `"*"` wildcard.
fn parse_order_ids(raw: &[String]) -> (Vec<OrderId>, bool) {
    let mut ids = Vec::new();
    let mut wildcard = false;
    for s in raw {
        if s == "*" {
            wildcard = true;
        } else if let Ok(uuid) = s.parse::<uuid::Uuid>() {
            ids.push(OrderId::from_uuid(uuid));
        }
    }
    (ids, wildcard)
}

fn parse_driver_ids(raw: &[String]) -> Vec<ActorId> {
    raw.iter()
        .filter_map(|s| s.parse::<uuid::Uuid>().ok())
        .map(ActorId::from_uuid)
        .collect()
}
