//! WebSocket bridge to a browser page hosting the real video widget.
//!
//! The page connects to `GET /v1/player/ws`. Widget calls made by the
//! [`PlayerMachine`](crate::player::PlayerMachine) are forwarded to the page
//! as `{"op": ..}` messages, and the page's `{"event": ..}` messages are fed
//! back to the machine as [`WidgetEvent`]s. Only one page is attached at a
//! time, a new connection replaces the previous one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::state::GuardedWidgetBridge;
use crate::player::{PlayerChrome, VideoWidget, WidgetEvent, WidgetState};

const OUTGOING_BUFFER: usize = 64;
const EVENTS_BUFFER: usize = 64;

/// Server to page message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum WidgetOp {
    #[serde(rename_all = "camelCase")]
    Load {
        video_id: String,
    },
    Play,
    Stop,
    SetVolume {
        volume: u8,
    },
    Unmute,
    #[serde(rename_all = "camelCase")]
    Overlay {
        duration_ms: u64,
    },
    ClearOverlay,
    Title {
        text: String,
    },
    Error {
        message: String,
    },
}

/// Page to server message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum PageEvent {
    Ready,
    #[serde(rename_all = "camelCase")]
    StateChange {
        state: WidgetState,
        #[serde(default)]
        video_id: Option<String>,
    },
    Error {
        code: i64,
    },
}

/// Last known widget state, as reported by the page.
#[derive(Debug, Default)]
struct Mirror {
    volume: Option<u8>,
    state: Option<WidgetState>,
}

struct Connection {
    id: u64,
    outgoing: mpsc::Sender<WidgetOp>,
}

pub struct WidgetBridge {
    connection: Mutex<Option<Connection>>,
    next_connection_id: AtomicU64,
    mirror: Mutex<Mirror>,
    events: mpsc::Sender<WidgetEvent>,
}

impl WidgetBridge {
    /// Returns the bridge and the receiving end of its widget events, to be
    /// handed to the player machine.
    pub fn new() -> (Arc<Self>, mpsc::Receiver<WidgetEvent>) {
        let (events, events_rx) = mpsc::channel(EVENTS_BUFFER);
        let bridge = Self {
            connection: Mutex::new(None),
            next_connection_id: AtomicU64::new(1),
            mirror: Mutex::new(Mirror::default()),
            events,
        };
        (Arc::new(bridge), events_rx)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.lock().unwrap().is_some()
    }

    /// Registers a new page connection and returns the ops it should forward.
    pub fn attach(&self) -> (u64, mpsc::Receiver<WidgetOp>) {
        let (outgoing, outgoing_rx) = mpsc::channel(OUTGOING_BUFFER);
        let id = self.next_connection_id.fetch_add(1, Ordering::SeqCst);
        let previous = self
            .connection
            .lock()
            .unwrap()
            .replace(Connection { id, outgoing });
        if let Some(previous) = previous {
            info!("Player page {} replaces previous page {}", id, previous.id);
        }
        *self.mirror.lock().unwrap() = Mirror::default();
        (id, outgoing_rx)
    }

    /// Forgets connection `id`, unless it was already replaced.
    pub fn detach(&self, id: u64) {
        let mut connection = self.connection.lock().unwrap();
        if connection.as_ref().is_some_and(|c| c.id == id) {
            *connection = None;
        }
    }

    async fn send_op(&self, op: WidgetOp) {
        let outgoing = self
            .connection
            .lock()
            .unwrap()
            .as_ref()
            .map(|c| c.outgoing.clone());
        match outgoing {
            Some(outgoing) => {
                if outgoing.send(op).await.is_err() {
                    debug!("Player page went away");
                }
            }
            None => debug!("No player page connected, dropping {:?}", op),
        }
    }

    pub async fn handle_page_event(&self, event: PageEvent) {
        let widget_event = match event {
            PageEvent::Ready => {
                // Widgets start at full volume.
                self.mirror.lock().unwrap().volume = Some(100);
                WidgetEvent::Ready
            }
            PageEvent::StateChange { state, video_id } => {
                self.mirror.lock().unwrap().state = Some(state);
                WidgetEvent::StateChanged { state, video_id }
            }
            PageEvent::Error { code } => WidgetEvent::Error(code),
        };
        if self.events.send(widget_event).await.is_err() {
            warn!("Player machine is not running, dropping widget event");
        }
    }
}

#[async_trait]
impl VideoWidget for WidgetBridge {
    async fn load(&self, video_id: &str) {
        self.send_op(WidgetOp::Load {
            video_id: video_id.to_string(),
        })
        .await;
    }

    async fn play(&self) {
        self.send_op(WidgetOp::Play).await;
    }

    async fn stop(&self) {
        self.send_op(WidgetOp::Stop).await;
    }

    async fn set_volume(&self, volume: u8) {
        self.mirror.lock().unwrap().volume = Some(volume);
        self.send_op(WidgetOp::SetVolume { volume }).await;
    }

    async fn volume(&self) -> Option<u8> {
        self.mirror.lock().unwrap().volume
    }

    async fn unmute(&self) {
        self.send_op(WidgetOp::Unmute).await;
    }

    async fn playback_state(&self) -> Option<WidgetState> {
        self.mirror.lock().unwrap().state
    }
}

#[async_trait]
impl PlayerChrome for WidgetBridge {
    async fn set_title(&self, title: &str) {
        self.send_op(WidgetOp::Title {
            text: title.to_string(),
        })
        .await;
    }

    fn has_overlay(&self) -> bool {
        self.is_connected()
    }

    async fn start_overlay_fade(&self, duration: Duration) {
        self.send_op(WidgetOp::Overlay {
            duration_ms: duration.as_millis() as u64,
        })
        .await;
    }

    async fn reset_overlay(&self) {
        self.send_op(WidgetOp::ClearOverlay).await;
    }

    async fn show_error(&self, message: &str) {
        self.send_op(WidgetOp::Error {
            message: message.to_string(),
        })
        .await;
    }
}

/// WebSocket upgrade handler for `GET /v1/player/ws`.
pub async fn player_ws_handler(
    ws: WebSocketUpgrade,
    State(bridge): State<GuardedWidgetBridge>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, bridge))
}

async fn handle_socket(socket: WebSocket, bridge: GuardedWidgetBridge) {
    let (connection_id, outgoing_rx) = bridge.attach();
    info!("Player page {} connected", connection_id);

    let (ws_sink, ws_stream) = socket.split();
    let outgoing_handle = tokio::spawn(forward_outgoing(ws_sink, outgoing_rx));

    process_incoming(ws_stream, &bridge).await;

    info!("Player page {} disconnected", connection_id);
    outgoing_handle.abort();
    bridge.detach(connection_id);
}

async fn forward_outgoing(
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut outgoing_rx: mpsc::Receiver<WidgetOp>,
) {
    while let Some(op) = outgoing_rx.recv().await {
        match serde_json::to_string(&op) {
            Ok(json) => {
                if ws_sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                error!("Failed to serialize widget op: {}", e);
            }
        }
    }
}

async fn process_incoming(
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    bridge: &WidgetBridge,
) {
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<PageEvent>(&text) {
                Ok(event) => {
                    debug!("Player page event: {:?}", event);
                    bridge.handle_page_event(event).await;
                }
                Err(e) => {
                    warn!("Failed to parse player page message: {}", e);
                }
            },
            Ok(Message::Binary(_)) => {
                debug!("Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                debug!("Received close frame");
                break;
            }
            Err(e) => {
                debug!("WebSocket error: {}", e);
                break;
            }
        }
    }
}
