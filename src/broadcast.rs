use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, instrument};

use crate::state::AppState;

/// Envelope for messages on the admin channel. Clients publish
/// `admin_message`; the server fans the payload back out to everyone as
/// `admin_broadcast`. The channel itself is unauthenticated.
#[derive(Debug, Serialize, Deserialize)]
struct ChannelEvent {
    event: String,
    data: serde_json::Value,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

#[instrument(skip(state, ws))]
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.broadcast.clone()))
}

async fn handle_socket(socket: WebSocket, tx: broadcast::Sender<String>) {
    debug!("client connected");
    let (mut sink, mut stream) = socket.split();
    let mut rx = tx.subscribe();

    // Fan-out half: every published broadcast goes to this client until it
    // hangs up. A lagged subscriber just loses the dropped messages.
    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    if sink.send(Message::Text(msg)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Publish half: incoming admin messages are rebroadcast to all clients,
    // sender included. Delivery is fire and forget.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            if let Message::Text(text) = msg {
                if let Some(out) = rebroadcast(&text) {
                    let _ = tx.send(out);
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    debug!("client disconnected");
}

/// Turns an incoming `admin_message` into the `admin_broadcast` to fan out,
/// with the payload untouched. Anything else on the channel is ignored.
fn rebroadcast(text: &str) -> Option<String> {
    let incoming: ChannelEvent = serde_json::from_str(text).ok()?;
    if incoming.event != "admin_message" {
        return None;
    }
    serde_json::to_string(&ChannelEvent {
        event: "admin_broadcast".into(),
        data: incoming.data,
    })
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn admin_message_becomes_admin_broadcast_with_same_payload() {
        let out = rebroadcast(r#"{"event":"admin_message","data":{"text":"hola"}}"#)
            .expect("rebroadcast");
        let event: ChannelEvent = serde_json::from_str(&out).unwrap();
        assert_eq!(event.event, "admin_broadcast");
        assert_eq!(event.data, json!({"text": "hola"}));
    }

    #[test]
    fn other_events_and_junk_are_dropped() {
        assert!(rebroadcast(r#"{"event":"ping","data":null}"#).is_none());
        assert!(rebroadcast("not json").is_none());
    }

    #[tokio::test]
    async fn every_subscriber_receives_the_broadcast() {
        let (tx, _) = broadcast::channel::<String>(8);
        let mut a = tx.subscribe();
        let mut b = tx.subscribe();

        let out = rebroadcast(r#"{"event":"admin_message","data":"aviso"}"#).unwrap();
        tx.send(out.clone()).unwrap();

        assert_eq!(a.recv().await.unwrap(), out);
        assert_eq!(b.recv().await.unwrap(), out);
    }
}
