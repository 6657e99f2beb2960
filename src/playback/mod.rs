mod controller;
mod queue;
mod selector;
mod service;
mod state;

pub use controller::{
    Controller, ControllerMode, ControllerSettings, DisplayLine, StatusOutcome,
    DEFAULT_ERROR_ADVANCE_DELAY, DEFAULT_SKIP_FADE_MS,
};
pub use queue::{PlayQueue, QueueEntry, QueueError, UNKNOWN_FIELD};
pub use selector::{Selection, SelectionSource, Selector};
pub use service::{ControllerService, SharedController};
pub use state::{NowPlaying, PlaybackState};
