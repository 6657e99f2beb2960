//! HTTP surface of the jukebox: catalog browsing, queueing, playback control
//! and the player widget bridge.

pub mod config;
mod http_layers;
pub mod server;
pub mod state;
pub mod widget_bridge;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
pub use state::ServerState;
pub use widget_bridge::{PageEvent, WidgetBridge, WidgetOp};
