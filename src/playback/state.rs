use super::queue::QueueEntry;
use super::selector::SelectionSource;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NowPlaying {
    pub id: String,
    pub title: String,
    pub artist: String,
}

impl From<QueueEntry> for NowPlaying {
    fn from(entry: QueueEntry) -> Self {
        Self {
            id: entry.id,
            title: entry.title,
            artist: entry.artist,
        }
    }
}

/// What the controller believes is playing.
///
/// At most one video is tracked. It is set right before its play command is
/// sent and cleared only by a matching status report or an explicit stop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaybackState {
    pub now_playing: Option<NowPlaying>,
    pub is_from_queue: bool,
}

impl PlaybackState {
    pub fn set(&mut self, now_playing: NowPlaying, source: SelectionSource) {
        self.now_playing = Some(now_playing);
        self.is_from_queue = source == SelectionSource::Queue;
    }

    pub fn clear(&mut self) {
        self.now_playing = None;
        self.is_from_queue = false;
    }

    pub fn current_id(&self) -> Option<&str> {
        self.now_playing.as_ref().map(|n| n.id.as_str())
    }

    /// True when `id` is present and equal to the tracked video.
    pub fn matches(&self, id: Option<&str>) -> bool {
        matches!((id, self.current_id()), (Some(a), Some(b)) if a == b)
    }
}
