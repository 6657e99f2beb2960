//! The controller side of the jukebox: catalog, queue and what is playing.
//!
//! All state lives in one owned [`Controller`]. Every method runs to
//! completion without awaiting, so callers that share it behind a mutex never
//! observe a half-applied transition.

use super::queue::{PlayQueue, QueueEntry, QueueError};
use super::selector::{Selection, Selector};
use super::state::{NowPlaying, PlaybackState};
use crate::catalog::Catalog;
use crate::channel::{Command, CommandSender, PlayerStatus, ProtocolError, StatusMessage};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_SKIP_FADE_MS: u64 = 3000;
pub const DEFAULT_ERROR_ADVANCE_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Fade duration sent with the `fadeOutAndBlack` of a skip.
    pub skip_fade_ms: u64,
    /// Pause between a playback error and the next selection.
    pub error_advance_delay: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            skip_fade_ms: DEFAULT_SKIP_FADE_MS,
            error_advance_delay: DEFAULT_ERROR_ADVANCE_DELAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "message", rename_all = "lowercase")]
pub enum ControllerMode {
    Loading,
    Ready,
    /// No playable songs.
    Idle,
    Error(String),
}

/// What the controller wants done after a status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    AdvanceNow,
    AdvanceAfter(Duration),
    None,
}

/// The "now playing" line shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayLine {
    pub artist: String,
    pub title: String,
}

impl DisplayLine {
    fn new(artist: &str, title: &str) -> Self {
        Self {
            artist: artist.to_string(),
            title: title.to_string(),
        }
    }
}

pub struct Controller {
    catalog: Arc<Catalog>,
    queue: PlayQueue,
    state: PlaybackState,
    selector: Selector,
    commands: CommandSender,
    mode: ControllerMode,
    display: Option<DisplayLine>,
    advance_after_fade: bool,
    settings: ControllerSettings,
}

impl Controller {
    pub fn new(
        catalog: Catalog,
        commands: CommandSender,
        selector: Selector,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            queue: PlayQueue::new(),
            state: PlaybackState::default(),
            selector,
            commands,
            mode: ControllerMode::Loading,
            display: None,
            advance_after_fade: false,
            settings,
        }
    }

    /// Checks the player link and starts initial playback.
    pub fn start(&mut self) -> Result<(), ProtocolError> {
        if !self.commands.link().is_open() {
            error!("Could not open player window");
            self.mode = ControllerMode::Error("Could not open player window".to_string());
            return Err(ProtocolError::LinkClosed);
        }
        self.mode = ControllerMode::Ready;
        info!("Triggering initial play.");
        self.advance();
        Ok(())
    }

    /// Plays the queue head, or a random playable song when the queue is
    /// empty.
    pub fn advance(&mut self) -> Option<Selection> {
        if matches!(self.mode, ControllerMode::Loading | ControllerMode::Error(_)) {
            warn!("Not advancing, controller is {:?}", self.mode);
            return None;
        }
        if self.catalog.get_songs_count() == 0 {
            warn!("No valid songs.");
            self.enter_idle();
            return None;
        }

        let Some(selection) = self.selector.select_next(&mut self.queue, &self.catalog) else {
            warn!("No valid songs for random.");
            self.enter_idle();
            return None;
        };
        info!(
            "Playing next from {:?}: {} - {}",
            selection.source, selection.entry.artist, selection.entry.title
        );

        let entry = selection.entry.clone();
        self.mode = ControllerMode::Ready;
        self.advance_after_fade = false;
        self.state.set(NowPlaying::from(entry.clone()), selection.source);
        if let Err(err) = self.commands.send(Command::Play {
            video_id: entry.id,
            title: entry.title.clone(),
            artist: entry.artist.clone(),
        }) {
            warn!("Play command not delivered: {}", err);
        }
        self.display = Some(DisplayLine::new(&entry.artist, &entry.title));
        Some(selection)
    }

    /// Delayed advances only fire when nothing started playing meanwhile.
    pub fn advance_if_idle(&mut self) -> Option<Selection> {
        if self.state.now_playing.is_some() {
            debug!("Skipping delayed advance, something is already playing");
            return None;
        }
        self.advance()
    }

    fn enter_idle(&mut self) {
        self.mode = ControllerMode::Idle;
        self.display = Some(DisplayLine::new("Idle", "No videos"));
    }

    /// Appends `entry`. Starts playback right away when the queue was empty
    /// and nothing is playing. Returns whether playback was started.
    pub fn enqueue(&mut self, entry: QueueEntry) -> Result<bool, QueueError> {
        let was_empty = self.queue.is_empty();
        if let Err(err) = self.queue.push(entry.clone()) {
            error!("Invalid video data for queue: {}", err);
            return Err(err);
        }
        info!("Adding: {} - {}", entry.artist, entry.title);

        if was_empty && self.state.now_playing.is_none() {
            info!("Starting queue playback.");
            return Ok(self.advance().is_some());
        }
        Ok(false)
    }

    /// Enqueues a catalog song by id.
    pub fn enqueue_song(&mut self, id: &str) -> Result<bool, QueueError> {
        let song = self
            .catalog
            .get_song(id)
            .ok_or_else(|| QueueError::UnknownSong(id.to_string()))?;
        let entry = QueueEntry::new(&song.id, Some(&song.title), Some(&song.artist_name))?;
        self.enqueue(entry)
    }

    pub fn handle_status(&mut self, status: StatusMessage) -> StatusOutcome {
        if status.status == PlayerStatus::Ready {
            info!("Player window ready.");
            return StatusOutcome::None;
        }

        if !self.state.matches(status.id.as_deref()) {
            let stale = ProtocolError::StaleStatus {
                expected: self.state.current_id().map(str::to_string),
                got: status.id.clone(),
            };
            warn!("Ignoring {:?} status: {}", status.status, stale);
            return StatusOutcome::None;
        }

        self.state.clear();
        match status.status {
            PlayerStatus::Ended => {
                self.display = None;
                self.advance_after_fade = false;
                StatusOutcome::AdvanceNow
            }
            PlayerStatus::Error => {
                let message = status
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("Code {}", status.code.unwrap_or_default()));
                warn!("Player reported error: {}", message);
                self.display = Some(DisplayLine::new("Error", &message));
                self.advance_after_fade = false;
                StatusOutcome::AdvanceAfter(self.settings.error_advance_delay)
            }
            PlayerStatus::FadeComplete => {
                self.display = None;
                if std::mem::take(&mut self.advance_after_fade) {
                    StatusOutcome::AdvanceNow
                } else {
                    StatusOutcome::None
                }
            }
            PlayerStatus::Ready => StatusOutcome::None,
        }
    }

    /// Fades the current video out. The next selection starts once the
    /// player reports the fade complete.
    pub fn skip(&mut self) -> Result<(), ProtocolError> {
        if self.state.now_playing.is_none() {
            self.advance();
            return Ok(());
        }
        self.commands.send(Command::FadeOutAndBlack {
            fade_duration: self.settings.skip_fade_ms,
        })?;
        self.advance_after_fade = true;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), ProtocolError> {
        self.state.clear();
        self.display = None;
        self.advance_after_fade = false;
        self.commands.send(Command::Stop)
    }

    /// Swaps in a freshly normalized catalog. The queue is kept.
    pub fn replace_catalog(&mut self, catalog: Catalog) {
        info!(
            "Replacing catalog: {} artists, {} songs",
            catalog.get_artists_count(),
            catalog.get_songs_count()
        );
        self.catalog = Arc::new(catalog);
        self.display = None;
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.clone()
    }

    pub fn queue(&self) -> Vec<QueueEntry> {
        self.queue.snapshot()
    }

    pub fn now_playing(&self) -> Option<&NowPlaying> {
        self.state.now_playing.as_ref()
    }

    pub fn playback_state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn mode(&self) -> &ControllerMode {
        &self.mode
    }

    pub fn display(&self) -> Option<&DisplayLine> {
        self.display.as_ref()
    }
}
