use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PlayerError {
    #[error("Player Failed to Initialize (Timeout) after {0:?}")]
    InitializationTimeout(Duration),
}

/// A playback failure reported by the video widget.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Player Error: {message} ({code})")]
pub struct PlaybackError {
    pub code: i64,
    pub message: String,
}

impl PlaybackError {
    pub fn from_code(code: i64) -> Self {
        Self {
            code,
            message: error_message(code),
        }
    }
}

pub fn error_message(code: i64) -> String {
    match code {
        2 => "Invalid parameter".to_string(),
        5 => "HTML5 player error".to_string(),
        100 => "Video not found".to_string(),
        101 | 150 => "Playback disallowed (embed)".to_string(),
        other => format!("Unknown error {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_codes() {
        assert_eq!(error_message(2), "Invalid parameter");
        assert_eq!(error_message(101), error_message(150));
        assert_eq!(error_message(7), "Unknown error 7");
        assert_eq!(
            PlaybackError::from_code(100).to_string(),
            "Player Error: Video not found (100)"
        );
    }
}
