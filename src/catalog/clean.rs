//! Offline catalog cleaning.
//!
//! Produces a catalog file with the same shape as the scraped one, minus the
//! videos whose thumbnail fails validation and minus artists left with no
//! videos at all. Unknown fields of kept records are written back untouched.

use super::normalizer::{validate_videos, NormalizerSettings, ValidationError, ValidationProgress};
use super::raw::{count_raw_videos, RawArtistRecord};
use super::thumbnail::ThumbnailProbe;
use super::video_id::extract_video_id;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleaningStats {
    pub original_artists: usize,
    pub original_videos: usize,
    pub removed_artists: usize,
    pub removed_videos: usize,
    pub remaining_artists: usize,
    pub remaining_videos: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanedCatalog {
    pub artists: Vec<RawArtistRecord>,
    pub stats: CleaningStats,
}

pub async fn clean_catalog<F>(
    raw: &[RawArtistRecord],
    probe: &dyn ThumbnailProbe,
    settings: &NormalizerSettings,
    on_progress: F,
) -> Result<CleanedCatalog, ValidationError>
where
    F: FnMut(ValidationProgress),
{
    let mut stats = CleaningStats {
        original_artists: raw.len(),
        original_videos: count_raw_videos(raw),
        ..Default::default()
    };
    info!(
        "Processing {} artists with {} total videos...",
        stats.original_artists, stats.original_videos
    );

    let report = validate_videos(raw, probe, settings, on_progress).await?;

    let mut artists = Vec::new();
    for (ai, artist) in raw.iter().enumerate() {
        if !artist.is_usable() {
            stats.removed_artists += 1;
            stats.removed_videos += artist.videos().len();
            continue;
        }

        let kept: Vec<_> = artist
            .videos()
            .iter()
            .enumerate()
            .filter(|(vi, video)| {
                report.is_valid(ai, *vi) && video.youtube_url().and_then(extract_video_id).is_some()
            })
            .map(|(_, video)| video.clone())
            .collect();
        stats.removed_videos += artist.videos().len() - kept.len();

        if kept.is_empty() {
            stats.removed_artists += 1;
            continue;
        }

        stats.remaining_videos += kept.len();
        artists.push(RawArtistRecord {
            music_videos: Some(kept),
            ..artist.clone()
        });
    }
    stats.remaining_artists = artists.len();

    info!(
        "Cleaning complete. Removed {} artists and {} videos, {} artists with {} videos remain.",
        stats.removed_artists, stats.removed_videos, stats.remaining_artists, stats.remaining_videos
    );

    Ok(CleanedCatalog { artists, stats })
}

/// Writes `artists` as a pretty-printed JSON array.
pub fn write_catalog<P: AsRef<Path>>(path: P, artists: &[RawArtistRecord]) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(artists).context("Failed to serialize catalog")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write catalog to {}", path.display()))?;
    info!("Cleaned catalog written to {}", path.display());
    Ok(())
}
