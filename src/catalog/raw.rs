//! Raw scraped catalog records, as they appear in the catalog JSON file.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single music video entry of an artist, as scraped.
///
/// Every field is optional on the wire: a record missing its title or url is
/// simply not eligible for playback, it never fails the whole load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RawVideoRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_thumb")]
    pub track_thumb: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An artist with its list of scraped videos.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RawArtistRecord {
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub mbid: Option<String>,
    #[serde(default)]
    pub music_videos: Option<Vec<RawVideoRecord>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The scraper writes missing thumbnails either as JSON null or as the
/// literal string "null"; both mean "no thumbnail".
fn deserialize_thumb<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty() && s != "null"))
}

impl RawVideoRecord {
    pub fn new(title: &str, youtube_url: &str, track_thumb: Option<&str>) -> Self {
        Self {
            title: Some(title.to_string()),
            youtube_url: Some(youtube_url.to_string()),
            track_thumb: track_thumb.map(|s| s.to_string()),
            extra: Map::new(),
        }
    }

    /// Title and url are both present and non-empty.
    pub fn has_title_and_url(&self) -> bool {
        non_empty(&self.title).is_some() && non_empty(&self.youtube_url).is_some()
    }

    pub fn title(&self) -> Option<&str> {
        non_empty(&self.title)
    }

    pub fn youtube_url(&self) -> Option<&str> {
        non_empty(&self.youtube_url)
    }

    pub fn track_thumb(&self) -> Option<&str> {
        non_empty(&self.track_thumb)
    }
}

impl RawArtistRecord {
    pub fn new(artist_name: &str, mbid: &str, music_videos: Vec<RawVideoRecord>) -> Self {
        Self {
            artist_name: Some(artist_name.to_string()),
            mbid: Some(mbid.to_string()),
            music_videos: Some(music_videos),
            extra: Map::new(),
        }
    }

    pub fn artist_name(&self) -> Option<&str> {
        non_empty(&self.artist_name)
    }

    pub fn mbid(&self) -> Option<&str> {
        non_empty(&self.mbid)
    }

    /// Videos listed for this artist, empty when the list is missing.
    pub fn videos(&self) -> &[RawVideoRecord] {
        self.music_videos.as_deref().unwrap_or(&[])
    }

    /// Artist records without a name or a video list are skipped by every
    /// pipeline stage.
    pub fn is_usable(&self) -> bool {
        self.artist_name().is_some() && self.music_videos.is_some()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Total number of listed videos across all artists.
pub fn count_raw_videos(artists: &[RawArtistRecord]) -> usize {
    artists.iter().map(|a| a.videos().len()).sum()
}
