use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use sitedesk_core::error::CoreError;

use crate::error::AppError;
use crate::middleware::auth::{authenticate, AuthUser};
use crate::state::AppState;
use crate::ws::manager::{json_message, WsManager};
use crate::ws::protocol::{ClientMessage, ServerMessage};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// GET /api/v1/ws?token=...
///
/// The token is checked before the upgrade, so an unauthenticated client gets
/// a plain 401 response instead of a socket.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let token = params.token.ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized("Missing token query parameter".into()))
    })?;
    let user = authenticate(&state, &token).await?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    let manager = Arc::clone(&state.ws_manager);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, manager, user)))
}

/// Drive one socket: register it, forward outbound messages from the
/// registry channel, answer client frames, and deregister on disconnect.
async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>, user: AuthUser) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let user_id = user.user_id;
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone(), user_id, user.is_admin).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    let greeting = ServerMessage::Connection {
        message: "Connected to server",
        user_id,
    };
    send_frame(&ws_manager, &conn_id, &greeting).await;

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => match ClientMessage::parse(text.as_str()) {
                Some(ClientMessage::Ping) => {
                    send_frame(&ws_manager, &conn_id, &ServerMessage::Pong { message: "Pong" })
                        .await;
                }
                Some(ClientMessage::RequestUserInfo) => {
                    let info = ServerMessage::UserInfo {
                        user_id,
                        connections_count: ws_manager.user_connection_count(user_id).await,
                    };
                    send_frame(&ws_manager, &conn_id, &info).await;
                }
                None => {
                    tracing::trace!(conn_id = %conn_id, "Ignoring unrecognized frame");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, user_id, "WebSocket disconnected");
}

async fn send_frame(ws_manager: &WsManager, conn_id: &str, frame: &ServerMessage<'_>) {
    match json_message(frame) {
        Ok(message) => {
            ws_manager.send_to_conn(conn_id, message).await;
        }
        Err(e) => tracing::error!(error = %e, "Failed to serialize WebSocket frame"),
    }
}
