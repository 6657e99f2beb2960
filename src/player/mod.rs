//! The player side of the jukebox.
//!
//! A [`PlayerMachine`] owns the embedded video widget. It executes the
//! commands found on the command key and reports what the widget does on the
//! status key.

mod errors;
mod fade;
mod machine;
mod state;
mod widget;

pub use errors::{error_message, PlaybackError, PlayerError};
pub use fade::{fade_steps, FADE_TICK};
pub use machine::{
    PlayerMachine, PlayerSettings, DEFAULT_INIT_TIMEOUT, DEFAULT_UNMUTE_DELAY, IDLE_TITLE,
    INIT_TIMEOUT_MESSAGE,
};
pub use state::{PlayerInput, PlayerState, Rejected};
pub use widget::{PlayerChrome, VideoWidget, WidgetEvent, WidgetState};
