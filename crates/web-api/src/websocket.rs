use arb_engine_orchestrator::{EngineEvent, EngineHandle, EngineStatus};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, Duration};

#[derive(Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
enum Frame<'a> {
    Status(&'a EngineStatus),
    Event(&'a EngineEvent),
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(engine): State<EngineHandle>,
) -> Response {
    ws.on_upgrade(|socket| websocket_connection(socket, engine))
}

async fn send(socket: &mut WebSocket, frame: &Frame<'_>) -> bool {
    let json = serde_json::to_string(frame).unwrap_or_default();
    socket.send(Message::Text(json)).await.is_ok()
}

async fn websocket_connection(mut socket: WebSocket, engine: EngineHandle) {
    let mut tick = interval(Duration::from_secs(1));
    let mut events = engine.subscribe();

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let status = engine.latest_status();
                if !send(&mut socket, &Frame::Status(&status)).await {
                    break;
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if !send(&mut socket, &Frame::Event(&event)).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("WebSocket client lagged, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed");
}
