use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::map::Notice;
use crate::services::session::{run_session, ClientCommand, ServerEvent, SessionContext};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/map/ws", get(map_socket))
}

#[derive(Debug, Deserialize)]
pub struct MapSocketQuery {
    pub client_id: Option<String>,
}

// GET /api/map/ws?client_id=...
async fn map_socket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(params): Query<MapSocketQuery>,
) -> Response {
    // Без client_id выбор не переживёт переподключение
    let client_id = params
        .client_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    ws.on_upgrade(move |socket| serve_socket(socket, state, client_id))
}

async fn serve_socket(socket: WebSocket, state: Arc<AppState>, client_id: String) {
    let (mut sink, mut stream) = socket.split();
    let (cmd_tx, cmd_rx) = mpsc::channel::<ClientCommand>(64);
    let (ev_tx, mut ev_rx) = mpsc::channel::<ServerEvent>(64);

    let ctx = SessionContext {
        venue: state.venue.clone(),
        map: state.config.map.clone(),
        live_feed: state.config.live_feed.clone(),
        store: state.store.clone(),
        client_id: client_id.clone(),
    };
    let session = tokio::spawn(run_session(ctx, cmd_rx, ev_tx.clone()));

    let writer = tokio::spawn(async move {
        while let Some(event) = ev_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to serialize session event: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientCommand>(text.as_str()) {
                Ok(command) => {
                    if cmd_tx.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!("Rejected command from {}: {}", client_id, e);
                    let notice = Notice::Invalid { message: format!("unrecognized command: {e}") };
                    if ev_tx.send(notice.into()).await.is_err() {
                        break;
                    }
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Закрываем входной канал - сессия останавливает кадры и симулятор
    drop(cmd_tx);
    drop(ev_tx);
    if let Err(e) = session.await {
        warn!("Session task for {} failed: {:?}", client_id, e);
    }
    writer.abort();
}
