//! WebSocket Connection Handler
//!
//! HELLO, then IDENTIFY (optional token plus course rooms), then READY and
//! course-room dispatches until the client goes silent or disconnects.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, timeout};
use uuid::Uuid;

use super::connection::ConnectionState;
use super::gateway::Gateway;
use super::messages::{
    GatewayReceive, GatewaySend, IdentifyPayload, OpCode, ReadyPayload, SubscribePayload,
    READY_EVENT,
};
use crate::presentation::middleware::decode_token;
use crate::startup::AppState;

/// Grace period added to the heartbeat interval before a silent connection is dropped
const HEARTBEAT_GRACE_MS: u64 = 10_000;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.max_message_size(state.settings.websocket.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4().to_string();
    let mut conn = ConnectionState::new(session_id.clone());

    tracing::debug!(session_id = %session_id, "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<GatewaySend>();

    let hello = GatewaySend::hello(state.gateway.heartbeat_interval());
    let hello = match serde_json::to_string(&hello) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode Hello");
            return;
        }
    };
    if let Err(e) = sender.send(Message::Text(hello.into())).await {
        tracing::debug!(error = %e, "Failed to send Hello");
        return;
    }

    // Forward queued frames to the socket
    let sender_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let identify_timeout = Duration::from_secs(state.settings.websocket.identify_timeout_secs);
    let identify = match timeout(identify_timeout, wait_for_identify(&mut receiver)).await {
        Ok(Some(identify)) => identify,
        Ok(None) => {
            tracing::debug!(session_id = %session_id, "Connection closed before Identify");
            sender_task.abort();
            return;
        }
        Err(_) => {
            tracing::debug!(session_id = %session_id, "Identify timeout");
            reject(&tx, sender_task).await;
            return;
        }
    };

    // Anonymous viewers may follow course rooms; a token that is present must be valid
    let user_id = match identify.token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => match decode_token(token, &state.settings.jwt.secret) {
            Ok(user) => Some(user.user_id),
            Err(e) => {
                tracing::debug!(session_id = %session_id, error = %e, "Invalid token");
                reject(&tx, sender_task).await;
                return;
            }
        },
        None => None,
    };

    conn.identify(user_id);

    // Receive events from before READY on; a client may fetch state once READY arrives.
    let mut event_rx = state.gateway.subscribe();

    let courses =
        state
            .gateway
            .register_session(session_id.clone(), user_id, identify.courses, tx.clone());

    let ready = ReadyPayload {
        session_id: session_id.clone(),
        user_id,
        courses,
    };
    let ready = match serde_json::to_value(ready) {
        Ok(payload) => GatewaySend::dispatch(READY_EVENT, conn.next_sequence(), payload),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode Ready");
            state.gateway.unregister_session(&session_id);
            sender_task.abort();
            return;
        }
    };
    if tx.send(ready).is_err() {
        state.gateway.unregister_session(&session_id);
        sender_task.abort();
        return;
    }

    tracing::info!(
        user_id = ?user_id,
        session_id = %session_id,
        "Gateway client identified"
    );

    let timeout_ms = state.gateway.heartbeat_interval() + HEARTBEAT_GRACE_MS;
    let silence_limit = Duration::from_millis(timeout_ms);
    let mut heartbeat_check = interval(silence_limit);
    heartbeat_check.tick().await; // Skip first immediate tick

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = handle_message(&text, &mut conn, &tx, &state.gateway) {
                            tracing::debug!(
                                session_id = %session_id,
                                error = %e,
                                "Error handling message"
                            );
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(session_id = %session_id, "Connection closed");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::debug!(session_id = %session_id, error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }

            event = event_rx.recv() => {
                match event {
                    Ok(routed) => {
                        if state.gateway.is_subscribed(&session_id, &routed.course_slug) {
                            let dispatch = GatewaySend::dispatch(
                                routed.name,
                                conn.next_sequence(),
                                routed.payload,
                            );
                            if tx.send(dispatch).is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            session_id = %session_id,
                            skipped = n,
                            "Event receiver lagged"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::error!("Gateway event channel closed");
                        break;
                    }
                }
            }

            _ = heartbeat_check.tick() => {
                if conn.is_silent_for(silence_limit) {
                    tracing::info!(
                        session_id = %session_id,
                        "Heartbeat timeout, closing connection"
                    );
                    break;
                }
            }
        }
    }

    state.gateway.unregister_session(&session_id);
    sender_task.abort();

    tracing::info!(
        user_id = ?conn.viewer(),
        session_id = %session_id,
        "Gateway client disconnected"
    );
}

/// Read frames until an IDENTIFY arrives or the socket closes
async fn wait_for_identify<S>(receiver: &mut S) -> Option<IdentifyPayload>
where
    S: futures::Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let Ok(frame) = serde_json::from_str::<GatewayReceive>(&text) else {
                    continue;
                };
                if OpCode::from_u8(frame.op) != Some(OpCode::Identify) {
                    continue;
                }
                let payload = frame.d.unwrap_or_else(|| serde_json::json!({}));
                if let Ok(identify) = serde_json::from_value::<IdentifyPayload>(payload) {
                    return Some(identify);
                }
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            _ => continue,
        }
    }
    None
}

async fn reject(tx: &mpsc::UnboundedSender<GatewaySend>, sender_task: tokio::task::JoinHandle<()>) {
    let _ = tx.send(GatewaySend::invalid_session());
    tokio::time::sleep(Duration::from_millis(100)).await;
    sender_task.abort();
}

/// Handle an incoming frame after IDENTIFY
fn handle_message(
    text: &str,
    conn: &mut ConnectionState,
    tx: &mpsc::UnboundedSender<GatewaySend>,
    gateway: &Gateway,
) -> Result<(), String> {
    let frame: GatewayReceive =
        serde_json::from_str(text).map_err(|e| format!("Invalid frame: {}", e))?;

    match OpCode::from_u8(frame.op) {
        Some(OpCode::Heartbeat) => {
            conn.record_heartbeat();
            let _ = tx.send(GatewaySend::heartbeat_ack());
            tracing::trace!(session_id = %conn.session_id, "Heartbeat received");
        }
        Some(op @ (OpCode::Subscribe | OpCode::Unsubscribe)) => {
            let payload: SubscribePayload = frame
                .d
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| format!("Invalid subscribe payload: {}", e))?
                .unwrap_or_default();
            if op == OpCode::Subscribe {
                gateway.subscribe_to_courses(&conn.session_id, payload.courses);
            } else {
                gateway.unsubscribe_from_courses(&conn.session_id, payload.courses);
            }
        }
        Some(OpCode::Identify) => {
            tracing::debug!(session_id = %conn.session_id, "Duplicate Identify ignored");
        }
        _ => {
            tracing::debug!(
                session_id = %conn.session_id,
                op = frame.op,
                "Unknown opcode"
            );
        }
    }

    Ok(())
}
