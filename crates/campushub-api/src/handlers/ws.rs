//! WebSocket upgrade handler and connection loop.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use campushub_entity::Principal;
use campushub_realtime::connection::heartbeat::{self, HeartbeatConfig};
use campushub_realtime::signal::types::CloseReason;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameter for WebSocket authentication.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// Access token.
    pub token: String,
}

/// GET /ws?token={credential} — WebSocket upgrade.
///
/// The credential is verified *before* the upgrade completes; a failed
/// verification yields a 401 (`auth-failed`) and no connection state is
/// ever created.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    let principal = state.verifier.verify(&query.token).await?;

    Ok(ws.on_upgrade(move |socket| handle_ws_connection(state, principal, socket)))
}

/// Drives one established WebSocket connection.
///
/// Cleanup is attached to every exit path: clean close, transport
/// error, and heartbeat timeout all funnel into the same unregister
/// call, which is idempotent.
async fn handle_ws_connection(state: AppState, principal: Principal, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handle, mut outbound_rx) = state.engine.connections.register(principal).await;
    let conn_id = handle.id;

    info!(
        conn_id = %conn_id,
        principal_id = %handle.principal_id(),
        "WebSocket connection established"
    );

    // Forward queued events to the socket, serializing per connection.
    let outbound_task = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "Failed to serialize outbound event");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut heartbeat_task = tokio::spawn(heartbeat::run_heartbeat(
        handle.clone(),
        HeartbeatConfig::from(&state.engine.config),
    ));

    let reason = loop {
        tokio::select! {
            // Heartbeat only returns once the connection is dead.
            _ = &mut heartbeat_task => break CloseReason::TransportError,
            inbound = ws_rx.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    state
                        .engine
                        .connections
                        .handle_action(&conn_id, text.as_str())
                        .await;
                }
                Some(Ok(Message::Close(_))) | None => break CloseReason::NormalClose,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break CloseReason::TransportError;
                }
            },
        }
    };

    outbound_task.abort();
    heartbeat_task.abort();
    state.engine.connections.unregister(&conn_id, reason);

    info!(
        conn_id = %conn_id,
        reason = reason.as_str(),
        "WebSocket connection closed"
    );
}
