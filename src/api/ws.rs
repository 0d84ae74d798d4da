use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = BroadcastStream::new(state.events_tx.subscribe());

    info!("websocket client connected");

    let send_task = tokio::spawn(async move {
        while let Some(next) = events.next().await {
            let event = match next {
                Ok(event) => event,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket client lagging; events dropped");
                    continue;
                }
            };

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize dispatch event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    end_with_first(send_task, recv_task).await;

    info!("websocket client disconnected");
}

/// Waits for either task, then cancels the other and waits for it to unwind
/// so its broadcast subscription is released.
async fn end_with_first(mut a: JoinHandle<()>, mut b: JoinHandle<()>) {
    tokio::select! {
        _ = &mut a => {
            b.abort();
            let _ = b.await;
        }
        _ = &mut b => {
            a.abort();
            let _ = a.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast;

    use super::end_with_first;

    #[tokio::test]
    async fn finished_reader_releases_the_event_subscription() {
        let (tx, mut rx) = broadcast::channel::<u32>(8);
        assert_eq!(tx.receiver_count(), 1);

        let sender = tokio::spawn(async move { while rx.recv().await.is_ok() {} });
        let reader = tokio::spawn(async {});

        end_with_first(sender, reader).await;

        assert_eq!(tx.receiver_count(), 0);
    }
}
