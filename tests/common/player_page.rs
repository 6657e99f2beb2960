//! A scripted stand-in for the browser page hosting the video widget.

use super::constants::EVENT_TIMEOUT_MS;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

pub struct PlayerPage {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl PlayerPage {
    pub async fn connect(ws_url: &str) -> Self {
        let (ws, _) = connect_async(ws_url)
            .await
            .expect("Failed to connect to player WebSocket");
        Self { ws }
    }

    pub async fn send_event(&mut self, event: Value) {
        self.ws
            .send(Message::Text(event.to_string().into()))
            .await
            .expect("Failed to send page event");
    }

    pub async fn ready(&mut self) {
        self.send_event(json!({"event": "ready"})).await;
    }

    pub async fn state_change(&mut self, state: &str, video_id: Option<&str>) {
        let mut event = json!({"event": "stateChange", "state": state});
        if let Some(id) = video_id {
            event["videoId"] = json!(id);
        }
        self.send_event(event).await;
    }

    /// Next op sent by the server, `None` on timeout or close.
    pub async fn next_op(&mut self) -> Option<Value> {
        loop {
            let message = timeout(Duration::from_millis(EVENT_TIMEOUT_MS), self.ws.next())
                .await
                .ok()??
                .ok()?;
            match message {
                Message::Text(text) => return serde_json::from_str(&text).ok(),
                Message::Close(_) => return None,
                _ => continue,
            }
        }
    }

    /// Skips ops until one named `op` arrives; returns it and everything
    /// skipped before it.
    pub async fn wait_for_op(&mut self, op: &str) -> (Value, Vec<Value>) {
        let mut skipped = Vec::new();
        loop {
            let next = self
                .next_op()
                .await
                .unwrap_or_else(|| panic!("Timed out waiting for op {:?}, got {:?}", op, skipped));
            if next["op"] == op {
                return (next, skipped);
            }
            skipped.push(next);
        }
    }

    /// Waits for the next `load` op and returns its video id.
    pub async fn wait_for_load(&mut self) -> String {
        let (load, _) = self.wait_for_op("load").await;
        load["videoId"]
            .as_str()
            .expect("load op without videoId")
            .to_string()
    }
}
