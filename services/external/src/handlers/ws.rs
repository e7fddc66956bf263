use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::repository::ConnectionLogRepository;
use crate::domain::types::ExternalSystem;
use crate::state::AppState;
use crate::ws::AckMessage;

use super::auth::SystemAuth;

/// GET /ws — subscriber socket. Auth happens at upgrade time from the same
/// headers as the HTTP ingress; a bad pair never reaches the socket layer.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    auth: SystemAuth,
) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state, auth.0))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClientMessage {
    Ack(AckMessage),
    Event { event: String },
}

async fn serve_socket(mut socket: WebSocket, state: AppState, system: ExternalSystem) {
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    let reply_tx = outbound_tx.clone();
    let pending = Arc::new(Mutex::new(HashMap::new()));

    let (conn_id, replaced) = state.sessions.register(system.id, outbound_tx, pending);
    if replaced.forced_disconnect {
        log_connection(&state, system.id, "DISCONNECTED", Some("replaced by new connection")).await;
    }
    log_connection(&state, system.id, "CONNECTED", None).await;
    info!(system = %system.system_name, "subscriber socket connected");

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => match outbound {
                Some(text) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                // Channel dropped: a newer socket displaced this one.
                None => break,
            },

            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    handle_client_message(&state, &system, text.as_str(), &reply_tx);
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(system = %system.system_name, error = %err, "socket error");
                    break;
                }
            }
        }
    }

    let _ = socket.send(Message::Close(None)).await;
    // Only the current owner of the mapping may remove it; a socket that
    // was already replaced must leave the new one alone.
    if state.sessions.unregister(system.id, conn_id) {
        log_connection(&state, system.id, "DISCONNECTED", None).await;
    }
    info!(system = %system.system_name, "subscriber socket closed");
}

fn handle_client_message(
    state: &AppState,
    system: &ExternalSystem,
    text: &str,
    reply: &mpsc::UnboundedSender<String>,
) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ack(ack)) => state.sessions.complete_ack(system.id, ack),
        Ok(ClientMessage::Event { event }) if event == "heartbeat" => {
            let _ = reply.send(serde_json::json!({ "status": "ok" }).to_string());
        }
        Ok(ClientMessage::Event { event }) => {
            debug!(system = %system.system_name, event, "unhandled client event");
        }
        Err(err) => {
            warn!(system = %system.system_name, error = %err, "unparseable client message");
        }
    }
}

async fn log_connection(state: &AppState, system_id: Uuid, event: &str, detail: Option<&str>) {
    if let Err(err) = state.connections().record(Some(system_id), event, detail).await {
        warn!(%system_id, event, error = %err, "connection log write failed");
    }
}
