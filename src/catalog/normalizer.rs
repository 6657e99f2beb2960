//! Raw catalog to final [`Catalog`] conversion.
//!
//! Two policies exist. [`ValidationMode::Skip`] is a synchronous pass with no
//! I/O that trusts every listed video. [`ValidationMode::Full`] fetches every
//! thumbnail, in batches, and keeps only videos whose thumbnail is a real
//! image and not the site's placeholder.

use super::models::{Artist, Catalog, Song};
use super::raw::{count_raw_videos, RawArtistRecord, RawVideoRecord};
use super::thumbnail::{classify, measure_placeholder, LocalThumbnails, ThumbnailProbe, ThumbnailVerdict};
use super::title::clean_title;
use super::video_id::extract_video_id;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    #[default]
    Skip,
    Full,
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Could not load placeholder thumbnail from {0}")]
    PlaceholderUnavailable(String),
    #[error("A validation run is already in progress")]
    AlreadyRunning,
}

#[derive(Debug, Clone)]
pub struct NormalizerSettings {
    pub batch_size: usize,
    /// Directory of previously downloaded `{video_id}.jpg` thumbnails.
    pub local_thumbnails_dir: Option<PathBuf>,
    /// Path or url of the reference placeholder image.
    pub placeholder: String,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            local_thumbnails_dir: None,
            placeholder: "generic_youtube_thumbnail.jpg".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationProgress {
    pub processed: usize,
    pub total: usize,
    pub percent: u8,
}

impl ValidationProgress {
    fn new(processed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100
        } else {
            ((processed as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            processed,
            total,
            percent,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationStats {
    pub valid: usize,
    pub placeholder: usize,
    pub fetch_failed: usize,
    pub missing_data: usize,
}

impl ValidationStats {
    fn record(&mut self, verdict: &ThumbnailVerdict) {
        match verdict {
            ThumbnailVerdict::Valid { .. } => self.valid += 1,
            ThumbnailVerdict::Placeholder => self.placeholder += 1,
            ThumbnailVerdict::FetchFailed(_) => self.fetch_failed += 1,
            ThumbnailVerdict::MissingData => self.missing_data += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.valid + self.placeholder + self.fetch_failed + self.missing_data
    }
}

/// Per-video verdicts of a full validation run, indexed like the raw input.
///
/// Artists that are not usable get an empty verdict list.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub verdicts: Vec<Vec<ThumbnailVerdict>>,
    pub stats: ValidationStats,
}

impl ValidationReport {
    pub fn is_valid(&self, artist_index: usize, video_index: usize) -> bool {
        self.verdicts
            .get(artist_index)
            .and_then(|v| v.get(video_index))
            .is_some_and(|v| v.is_valid())
    }
}

/// A normalized catalog and, for full validation, how the videos fared.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub catalog: Catalog,
    pub stats: Option<ValidationStats>,
}

/// Fast path: no thumbnail checks, every listed video counts.
pub fn normalize_without_validation(raw: &[RawArtistRecord]) -> Catalog {
    info!("Processing {} artists without validation...", raw.len());
    let catalog = group(raw, ValidationMode::Skip, |_, _| true);
    info!(
        "Processing done. Artists: {}, Songs: {}",
        catalog.get_artists_count(),
        catalog.get_songs_count()
    );
    catalog
}

/// Normalizes `raw` with the given policy.
///
/// `on_progress` is called after each validated batch and never in
/// [`ValidationMode::Skip`].
pub async fn normalize<F>(
    raw: &[RawArtistRecord],
    mode: ValidationMode,
    probe: &dyn ThumbnailProbe,
    settings: &NormalizerSettings,
    on_progress: F,
) -> Result<Normalized, ValidationError>
where
    F: FnMut(ValidationProgress),
{
    match mode {
        ValidationMode::Skip => Ok(Normalized {
            catalog: normalize_without_validation(raw),
            stats: None,
        }),
        ValidationMode::Full => {
            let report = validate_videos(raw, probe, settings, on_progress).await?;
            let catalog = group(raw, ValidationMode::Full, |a, v| report.is_valid(a, v));
            info!(
                "Cleaning done. Artists: {}, Songs: {}",
                catalog.get_artists_count(),
                catalog.get_songs_count()
            );
            Ok(Normalized {
                catalog,
                stats: Some(report.stats),
            })
        }
    }
}

/// Checks the thumbnail of every video of every usable artist.
pub async fn validate_videos<F>(
    raw: &[RawArtistRecord],
    probe: &dyn ThumbnailProbe,
    settings: &NormalizerSettings,
    mut on_progress: F,
) -> Result<ValidationReport, ValidationError>
where
    F: FnMut(ValidationProgress),
{
    let placeholder_size = measure_placeholder(probe, &settings.placeholder)
        .await
        .ok_or_else(|| ValidationError::PlaceholderUnavailable(settings.placeholder.clone()))?;
    info!("Placeholder thumbnail size: {} bytes", placeholder_size);

    let local = settings.local_thumbnails_dir.as_ref().map(LocalThumbnails::new);

    let mut verdicts: Vec<Vec<ThumbnailVerdict>> = raw
        .iter()
        .map(|a| {
            if a.is_usable() {
                vec![ThumbnailVerdict::MissingData; a.videos().len()]
            } else {
                Vec::new()
            }
        })
        .collect();

    let positions: Vec<(usize, usize)> = raw
        .iter()
        .enumerate()
        .filter(|(_, a)| a.is_usable())
        .flat_map(|(ai, a)| (0..a.videos().len()).map(move |vi| (ai, vi)))
        .collect();
    let total = positions.len();
    info!(
        "Starting validation for {} videos ({} listed)...",
        total,
        count_raw_videos(raw)
    );

    let batch_size = settings.batch_size.max(1);
    let mut processed = 0;
    let mut stats = ValidationStats::default();

    for batch in positions.chunks(batch_size) {
        let checks = batch.iter().map(|&(ai, vi)| {
            check_video(&raw[ai].videos()[vi], probe, local.as_ref(), placeholder_size)
        });
        let results = join_all(checks).await;

        for (&(ai, vi), verdict) in batch.iter().zip(results) {
            if let ThumbnailVerdict::FetchFailed(reason) = &verdict {
                debug!(
                    "Invalid thumbnail for {:?}: {}",
                    raw[ai].videos()[vi].title(),
                    reason
                );
            }
            stats.record(&verdict);
            verdicts[ai][vi] = verdict;
        }

        processed += batch.len();
        on_progress(ValidationProgress::new(processed, total));
        tokio::task::yield_now().await;
    }

    info!(
        "Validation complete. valid: {}, placeholder: {}, failed: {}, missing data: {}",
        stats.valid, stats.placeholder, stats.fetch_failed, stats.missing_data
    );

    Ok(ValidationReport { verdicts, stats })
}

async fn check_video(
    video: &RawVideoRecord,
    probe: &dyn ThumbnailProbe,
    local: Option<&LocalThumbnails>,
    placeholder_size: u64,
) -> ThumbnailVerdict {
    let thumb = match (video.has_title_and_url(), video.track_thumb()) {
        (true, Some(thumb)) => thumb,
        _ => return ThumbnailVerdict::MissingData,
    };

    if let (Some(local), Some(id)) = (local, video.youtube_url().and_then(extract_video_id)) {
        if let Some(size) = local.size_of(&id).await {
            if size != placeholder_size {
                return ThumbnailVerdict::Valid { size };
            }
        }
    }

    classify(probe.fetch_size(thumb).await, placeholder_size)
}

struct ArtistGroup<'a> {
    name: &'a str,
    mbid: &'a str,
    listed: usize,
    kept: Vec<&'a RawVideoRecord>,
}

/// Groups kept videos by artist mbid, in original order, and builds the
/// sorted catalog.
///
/// In skip mode an artist is emitted whenever its raw list is non-empty and
/// `video_count` is the raw listed count, even when some of those videos do
/// not produce a song. In full mode `video_count` is the number of songs the
/// artist ends up with and artists without songs are dropped.
fn group<K>(raw: &[RawArtistRecord], mode: ValidationMode, keep: K) -> Catalog
where
    K: Fn(usize, usize) -> bool,
{
    let mut groups: Vec<ArtistGroup> = Vec::new();

    for (ai, artist) in raw.iter().enumerate() {
        if !artist.is_usable() {
            continue;
        }
        let Some(mbid) = artist.mbid() else {
            warn!(
                "Skipping artist {:?} without mbid",
                artist.artist_name().unwrap_or_default()
            );
            continue;
        };
        let name = artist.artist_name().unwrap_or_default();

        let idx = match groups.iter().position(|g| g.mbid == mbid) {
            Some(idx) => idx,
            None => {
                groups.push(ArtistGroup {
                    name,
                    mbid,
                    listed: 0,
                    kept: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        group.listed += artist.videos().len();
        group.kept.extend(
            artist
                .videos()
                .iter()
                .enumerate()
                .filter(|(vi, _)| keep(ai, *vi))
                .map(|(_, v)| v),
        );
    }

    let mut seen_ids = HashSet::new();
    let mut artists = Vec::new();
    let mut songs = Vec::new();

    for group in groups {
        let mut artist_songs = Vec::new();
        for video in &group.kept {
            let (Some(title), Some(url)) = (video.title(), video.youtube_url()) else {
                continue;
            };
            let Some(id) = extract_video_id(url) else {
                continue;
            };
            let cleaned = clean_title(title, group.name);
            if cleaned.trim().is_empty() {
                continue;
            }
            if !seen_ids.insert(id.clone()) {
                debug!("Duplicate video id {} dropped", id);
                continue;
            }
            artist_songs.push(Song {
                id,
                title: cleaned,
                artist_name: group.name.to_string(),
                artist_mbid: group.mbid.to_string(),
                youtube_url: url.to_string(),
                track_thumb: video.track_thumb().map(|t| t.to_string()),
            });
        }

        let video_count = match mode {
            ValidationMode::Skip => group.listed,
            ValidationMode::Full => artist_songs.len(),
        };
        if video_count == 0 {
            continue;
        }

        artists.push(Artist {
            artist_name: group.name.to_string(),
            artist_mbid: group.mbid.to_string(),
            artist_thumb: group
                .kept
                .iter()
                .find_map(|v| v.track_thumb())
                .map(|t| t.to_string()),
            video_count,
        });
        songs.extend(artist_songs);
    }

    Catalog::new(artists, songs)
}
