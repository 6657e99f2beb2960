//! Test fixtures: the raw catalog file and test doubles for the video widget.

use super::constants::*;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;
use video_jukebox::player::{PlayerChrome, VideoWidget, WidgetState};

/// Creates a temporary raw catalog with 2 artists and 3 videos, plus an
/// artist without mbid that the normalizer drops.
/// Returns (temp_dir, catalog_path)
pub fn create_test_catalog() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let catalog_path = dir.path().join("Videos_by_Artist.JSON");

    let catalog = json!([
        {
            "artist_name": ARTIST_1_NAME,
            "mbid": ARTIST_1_MBID,
            "music_videos": [
                {
                    "title": format!("{} (Official Video)", SONG_1_TITLE),
                    "youtube_url": format!("https://www.youtube.com/watch?v={}", SONG_1_ID),
                    "track_thumb": "https://img.example.com/1.jpg"
                },
                {
                    "title": SONG_2_TITLE,
                    "youtube_url": format!("https://youtu.be/{}", SONG_2_ID),
                    "track_thumb": "https://img.example.com/2.jpg"
                }
            ]
        },
        {
            "artist_name": ARTIST_2_NAME,
            "mbid": ARTIST_2_MBID,
            "music_videos": [
                {
                    "title": SONG_3_TITLE,
                    "youtube_url": format!("https://www.youtube.com/embed/{}", SONG_3_ID),
                    "track_thumb": "https://img.example.com/3.jpg"
                }
            ]
        },
        {
            "artist_name": "No Mbid",
            "music_videos": [
                {
                    "title": "Lost Song",
                    "youtube_url": "https://youtu.be/lostsong001",
                    "track_thumb": "https://img.example.com/4.jpg"
                }
            ]
        }
    ]);
    fs::write(&catalog_path, serde_json::to_string_pretty(&catalog)?)?;

    Ok((dir, catalog_path))
}

/// A widget call, as recorded by [`FakeWidget`].
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCall {
    Load(String),
    Play,
    Stop,
    Volume(u8),
    Unmute,
    Title(String),
    OverlayFade(Duration),
    ResetOverlay,
    ShowError(String),
}

/// In-memory widget and chrome that only records what it is asked to do.
pub struct FakeWidget {
    calls: Mutex<Vec<WidgetCall>>,
    volume: Mutex<u8>,
}

impl FakeWidget {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            volume: Mutex::new(100),
        }
    }

    pub fn calls(&self) -> Vec<WidgetCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Ids passed to `load`, in order.
    pub fn loads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                WidgetCall::Load(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: WidgetCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl VideoWidget for FakeWidget {
    async fn load(&self, video_id: &str) {
        self.record(WidgetCall::Load(video_id.to_string()));
    }

    async fn play(&self) {
        self.record(WidgetCall::Play);
    }

    async fn stop(&self) {
        self.record(WidgetCall::Stop);
    }

    async fn set_volume(&self, volume: u8) {
        *self.volume.lock().unwrap() = volume;
        self.record(WidgetCall::Volume(volume));
    }

    async fn volume(&self) -> Option<u8> {
        Some(*self.volume.lock().unwrap())
    }

    async fn unmute(&self) {
        self.record(WidgetCall::Unmute);
    }

    async fn playback_state(&self) -> Option<WidgetState> {
        None
    }
}

#[async_trait]
impl PlayerChrome for FakeWidget {
    async fn set_title(&self, title: &str) {
        self.record(WidgetCall::Title(title.to_string()));
    }

    fn has_overlay(&self) -> bool {
        true
    }

    async fn start_overlay_fade(&self, duration: Duration) {
        self.record(WidgetCall::OverlayFade(duration));
    }

    async fn reset_overlay(&self) {
        self.record(WidgetCall::ResetOverlay);
    }

    async fn show_error(&self, message: &str) {
        self.record(WidgetCall::ShowError(message.to_string()));
    }
}
