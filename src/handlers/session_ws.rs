use std::sync::Arc;
use axum::{
    extract::{Query, State, ws::{Message, WebSocket, WebSocketUpgrade}},
    http::StatusCode,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::{
    models::ErrorResponse,
    presence::{ParticipantProfile, SessionPresenceRegistry},
    state::AppState,
    sync::{SessionStatePatch, SyncUpdate},
    utils::scope_guard::ScopeGuard,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionWsQuery {
    pub peer_id: Option<String>,
    pub name: Option<String>,
}

/// Session websocket: pushes every snapshot of the shared state
pub async fn session_ws(
    Query(query): Query<SessionWsQuery>,
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    info!("New session WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, query, state))
}

/// Snapshots go out as the state itself, an unavailable document as a 503 error body.
fn encode_update(update: SyncUpdate) -> serde_json::Result<String> {
    match update {
        SyncUpdate::Snapshot(snapshot) => serde_json::to_string(&snapshot),
        SyncUpdate::Unavailable(e) => {
            let (_, body) = ErrorResponse::reply(StatusCode::SERVICE_UNAVAILABLE, e.to_string());
            serde_json::to_string(&body.0)
        }
    }
}

async fn handle_socket(socket: WebSocket, query: SessionWsQuery, state: AppState) {

    // Count the connection until this function returns
    let open = state.ws_opened();
    let counter = state.clone();
    let _guard = ScopeGuard::new(move || {
        let left = counter.ws_closed();
        info!("Session WebSocket terminated ({} open)", left);
    });
    info!("Session WebSocket established ({} open)", open);

    // Register the peer in the roster for the lifetime of the socket.
    // Dropping the registry closes its realtime connection, which removes the record.
    let _presence = match &query.peer_id {
        Some(peer_id) => {
            let name = query.name.clone().unwrap_or_else(|| peer_id.clone());
            let registry = SessionPresenceRegistry::new(
                Arc::new(state.realtime.connect()),
                ParticipantProfile::new(peer_id.clone(), name, state.session_group.clone()),
            );
            if let Err(e) = registry.register_user().await {
                error!("Failed to register peer {}: {}", peer_id, e);
            }
            Some(registry)
        }
        None => None,
    };

    let (mut sender, mut receiver) = socket.split();
    let mut updates = state.sync.subscribe();
    let sync = state.sync.clone();

    // Push every snapshot to the client
    let mut send_task = tokio::spawn(async move {
        while let Some(update) = updates.next().await {
            let payload = match encode_update(update) {
                Ok(payload) => payload,
                Err(e) => {
                    error!("Failed to encode session state: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    // Text frames from the client are partial updates of the shared state
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            let patch: SessionStatePatch = match serde_json::from_str(&text) {
                Ok(patch) => patch,
                Err(e) => {
                    warn!("Ignoring malformed session patch: {}", e);
                    continue;
                }
            };
            debug!("Session patch received over websocket: {:?}", patch);
            let _ = sync.publish(patch).await;
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncUnavailable;
    use crate::sync::SharedSessionState;

    #[test]
    fn unavailable_document_is_sent_as_service_unavailable() {
        let frame: serde_json::Value =
            serde_json::from_str(&encode_update(SyncUpdate::Unavailable(SyncUnavailable)).unwrap()).unwrap();
        assert_eq!(frame["code"], 503);
        assert!(frame["error"].is_string());
    }

    #[test]
    fn snapshot_is_sent_as_the_state_itself() {
        let state = SharedSessionState::default();
        let frame: serde_json::Value =
            serde_json::from_str(&encode_update(SyncUpdate::Snapshot(state.clone())).unwrap()).unwrap();
        assert_eq!(frame, serde_json::to_value(&state).unwrap());
    }
}
