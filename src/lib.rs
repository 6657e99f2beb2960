//! Video Jukebox Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod catalog;
pub mod channel;
pub mod config;
pub mod playback;
pub mod player;
pub mod server;

// Re-export commonly used types for convenience
pub use catalog::{Catalog, RawArtistRecord};
pub use playback::{Controller, ControllerService, SharedController};
pub use player::PlayerMachine;
pub use server::{run_server, RequestsLoggingLevel, WidgetBridge};
