//! Capabilities the player needs from its embedded video widget and from the
//! window hosting it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback state as reported by the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    Ready,
    StateChanged {
        state: WidgetState,
        /// Id of the loaded video, when the widget knows it.
        video_id: Option<String>,
    },
    Error(i64),
}

#[async_trait]
pub trait VideoWidget: Send + Sync {
    async fn load(&self, video_id: &str);
    async fn play(&self);
    async fn stop(&self);
    /// Volume in percent, 0 to 100.
    async fn set_volume(&self, volume: u8);
    /// Current volume, `None` when the widget cannot report it.
    async fn volume(&self) -> Option<u8>;
    async fn unmute(&self);
    async fn playback_state(&self) -> Option<WidgetState>;
}

#[async_trait]
pub trait PlayerChrome: Send + Sync {
    async fn set_title(&self, title: &str);
    /// Whether a fade overlay is available at all.
    fn has_overlay(&self) -> bool;
    /// Starts fading the overlay to black over `duration`.
    async fn start_overlay_fade(&self, duration: Duration);
    async fn reset_overlay(&self);
    async fn show_error(&self, message: &str);
}
