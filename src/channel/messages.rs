//! JSON envelopes exchanged over the shared store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Controller to player.
pub const COMMAND_KEY: &str = "jukeboxCommand";
/// Player to controller.
pub const STATUS_KEY: &str = "jukeboxStatus";

pub const DEFAULT_FADE_DURATION_MS: u64 = 5000;

fn default_fade_duration() -> u64 {
    DEFAULT_FADE_DURATION_MS
}

#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(String),
    #[error("Status for {got:?} while tracking {expected:?}")]
    StaleStatus {
        expected: Option<String>,
        got: Option<String>,
    },
    #[error("Player link is not open")]
    LinkClosed,
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::Malformed(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    Play {
        video_id: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        artist: String,
    },
    Stop,
    #[serde(rename_all = "camelCase")]
    FadeOutAndBlack {
        #[serde(default = "default_fade_duration")]
        fade_duration: u64,
    },
}

impl Command {
    pub fn action(&self) -> &'static str {
        match self {
            Command::Play { .. } => "play",
            Command::Stop => "stop",
            Command::FadeOutAndBlack { .. } => "fadeOutAndBlack",
        }
    }
}

/// A command as written to [`COMMAND_KEY`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandEnvelope {
    #[serde(flatten)]
    pub command: Command,
    /// Milliseconds since epoch, set right before the write.
    #[serde(default)]
    pub timestamp: i64,
}

impl CommandEnvelope {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            timestamp: now_millis(),
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PlayerStatus {
    Ready,
    Ended,
    Error,
    FadeComplete,
}

/// A status report as written to [`STATUS_KEY`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusMessage {
    pub status: PlayerStatus,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusMessage {
    fn with_status(status: PlayerStatus, id: Option<String>) -> Self {
        Self {
            status,
            id,
            timestamp: now_millis(),
            code: None,
            message: None,
        }
    }

    pub fn ready() -> Self {
        Self::with_status(PlayerStatus::Ready, None)
    }

    pub fn ended(id: Option<String>) -> Self {
        Self::with_status(PlayerStatus::Ended, id)
    }

    pub fn fade_complete(id: Option<String>) -> Self {
        Self::with_status(PlayerStatus::FadeComplete, id)
    }

    pub fn error(id: Option<String>, code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: Some(message.into()),
            ..Self::with_status(PlayerStatus::Error, id)
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
