use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

use crate::api::rest::couriers::MoveRequest;
use crate::state::AppState;

/// Frames accepted from clients: `{"type": "move", "data": {"direction": 0, "zoom": 14}}`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
enum ClientMessage {
    Move(MoveRequest),
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let updates = BroadcastStream::new(state.status_tx.subscribe());

    info!("websocket client connected");

    match state.facade.status().await {
        Ok(status) => match serde_json::to_string(&status) {
            Ok(json) => {
                if sender.send(Message::Text(json)).await.is_err() {
                    return;
                }
            }
            Err(err) => warn!(error = %err, "failed to serialize status for ws"),
        },
        Err(err) => warn!(error = %err, "failed to load initial status for ws"),
    }

    let send_task = tokio::spawn(async move {
        let mut updates = updates;
        while let Some(update) = updates.next().await {
            let status = match update {
                Ok(status) => status,
                Err(err) => {
                    debug!(error = %err, "ws subscriber lagged behind status updates");
                    continue;
                }
            };

            let json = match serde_json::to_string(&status) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize status for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let text = match msg {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };

            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Move(request)) => {
                    // failures are logged and counted by the state
                    let _ = recv_state
                        .move_courier(request.direction, request.zoom)
                        .await;
                }
                Err(err) => warn!(error = %err, "ignoring malformed ws message"),
            }
        }
    });

    run_until_first_exits(send_task, recv_task).await;

    info!("websocket client disconnected");
}

/// Waits for either half of a socket to finish and aborts the other.
async fn run_until_first_exits(mut send_task: JoinHandle<()>, mut recv_task: JoinHandle<()>) {
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::{run_until_first_exits, ClientMessage};
    use crate::models::courier::Direction;

    #[test]
    fn parses_move_frames() {
        let frame = r#"{"type":"move","data":{"direction":1,"zoom":15}}"#;
        let ClientMessage::Move(request) = serde_json::from_str(frame).unwrap();
        assert_eq!(request.direction, Direction::Down);
        assert_eq!(request.zoom, 15);

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"jump","data":{}}"#).is_err());
        assert!(
            serde_json::from_str::<ClientMessage>(r#"{"type":"move","data":{"direction":9,"zoom":1}}"#)
                .is_err()
        );
    }

    #[tokio::test]
    async fn finished_half_aborts_the_other() {
        let (alive_tx, alive_rx) = oneshot::channel::<()>();
        let finished = tokio::spawn(async {});
        let pending = tokio::spawn(async move {
            let _alive = alive_tx;
            std::future::pending::<()>().await;
        });

        run_until_first_exits(finished, pending).await;

        // the sender is dropped only once the pending half is aborted
        assert!(alive_rx.await.is_err());
    }
}
