//! Controller/player coordination over a [`SharedStore`].
//!
//! Commands travel on [`COMMAND_KEY`], status reports on [`STATUS_KEY`]. Both
//! are fire-and-forget: there is no acknowledgement and a newer write simply
//! replaces an older unread one.

mod messages;
mod store;

pub use messages::{
    now_millis, Command, CommandEnvelope, PlayerStatus, ProtocolError, StatusMessage, COMMAND_KEY,
    DEFAULT_FADE_DURATION_MS, STATUS_KEY,
};
pub use store::{SharedStore, StoreWatcher};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Whether the player side is currently reachable.
///
/// Opened when the player task is spawned, closed when it stops.
#[derive(Clone, Default)]
pub struct PlayerLink {
    open: Arc<AtomicBool>,
}

impl PlayerLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct CommandSender {
    store: SharedStore,
    link: PlayerLink,
}

impl CommandSender {
    pub fn new(store: SharedStore, link: PlayerLink) -> Self {
        Self { store, link }
    }

    pub fn link(&self) -> &PlayerLink {
        &self.link
    }

    /// Stamps and writes `command`. Nothing is written when the player link
    /// is closed.
    pub fn send(&self, command: Command) -> Result<(), ProtocolError> {
        if !self.link.is_open() {
            warn!("Player link is not open, dropping {} command", command.action());
            return Err(ProtocolError::LinkClosed);
        }
        let text = CommandEnvelope::new(command).encode()?;
        debug!("Sending command {}", text);
        self.store.replace_and_notify(COMMAND_KEY, text);
        Ok(())
    }
}

pub struct CommandReceiver {
    watcher: StoreWatcher,
}

impl CommandReceiver {
    pub fn new(store: SharedStore) -> Self {
        Self {
            watcher: store.watch(COMMAND_KEY),
        }
    }

    /// The command currently stored, if any. It counts as seen, so
    /// [`next`](Self::next) will not yield it again.
    pub fn current(&mut self) -> Option<Result<CommandEnvelope, ProtocolError>> {
        self.watcher
            .latest()
            .map(|text| CommandEnvelope::decode(&text))
    }

    /// Next command written after the previous call. `None` once the store
    /// is gone.
    pub async fn next(&mut self) -> Option<Result<CommandEnvelope, ProtocolError>> {
        let text = self.watcher.changed().await?;
        Some(CommandEnvelope::decode(&text))
    }
}

#[derive(Clone)]
pub struct StatusSender {
    store: SharedStore,
}

impl StatusSender {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn send(&self, status: StatusMessage) {
        match status.encode() {
            Ok(text) => {
                debug!("Sending status {}", text);
                self.store.replace_and_notify(STATUS_KEY, text);
            }
            Err(err) => warn!("Could not encode status: {}", err),
        }
    }
}

pub struct StatusReceiver {
    watcher: StoreWatcher,
}

impl StatusReceiver {
    pub fn new(store: &SharedStore) -> Self {
        Self {
            watcher: store.watch(STATUS_KEY),
        }
    }

    pub async fn next(&mut self) -> Option<Result<StatusMessage, ProtocolError>> {
        let text = self.watcher.changed().await?;
        Some(StatusMessage::decode(&text))
    }
}
