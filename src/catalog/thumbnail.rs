//! Thumbnail probing used by full validation.
//!
//! Video sites serve a generic placeholder image for videos that have no real
//! thumbnail (usually because the video is gone). The placeholder always has
//! the same byte size, so a thumbnail whose size matches it exactly is
//! treated as "no thumbnail".

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a thumbnail could not be measured.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProbeFailure {
    #[error("Request failed: {0}")]
    Request(String),
    #[error("HTTP error: {0}")]
    HttpStatus(u16),
    #[error("Not an image: {0}")]
    NotAnImage(String),
    #[error("Zero-byte image")]
    Empty,
}

/// Measures the byte size of an image.
#[async_trait]
pub trait ThumbnailProbe: Send + Sync {
    /// Fetches the image at `url` and returns its size in bytes.
    async fn fetch_size(&self, url: &str) -> Result<u64, ProbeFailure>;
}

/// Outcome of checking one video's thumbnail.
#[derive(Debug, Clone, PartialEq)]
pub enum ThumbnailVerdict {
    Valid { size: u64 },
    Placeholder,
    FetchFailed(ProbeFailure),
    /// The record lacks a title, url or thumbnail and was never fetched.
    MissingData,
}

impl ThumbnailVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, ThumbnailVerdict::Valid { .. })
    }
}

/// Classifies a measured size against the placeholder size.
pub fn classify(measured: Result<u64, ProbeFailure>, placeholder_size: u64) -> ThumbnailVerdict {
    match measured {
        Ok(0) => ThumbnailVerdict::FetchFailed(ProbeFailure::Empty),
        Ok(size) if size == placeholder_size => ThumbnailVerdict::Placeholder,
        Ok(size) => ThumbnailVerdict::Valid { size },
        Err(failure) => ThumbnailVerdict::FetchFailed(failure),
    }
}

/// Probe backed by an HTTP client.
///
/// Local paths (anything that is not an http(s) url) are read from disk, so
/// the same probe can measure a placeholder image shipped next to the catalog.
pub struct HttpThumbnailProbe {
    client: reqwest::Client,
}

impl HttpThumbnailProbe {
    pub fn new(timeout_sec: u64) -> Result<Self, ProbeFailure> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .map_err(|e| ProbeFailure::Request(e.to_string()))?;
        Ok(Self { client })
    }

    async fn fetch_remote(&self, url: &str) -> Result<u64, ProbeFailure> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| ProbeFailure::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::NOT_FOUND {
                debug!("404: {}", url);
            }
            return Err(ProbeFailure::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(ProbeFailure::NotAnImage(content_type));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProbeFailure::Request(e.to_string()))?;
        if bytes.is_empty() {
            return Err(ProbeFailure::Empty);
        }
        Ok(bytes.len() as u64)
    }
}

#[async_trait]
impl ThumbnailProbe for HttpThumbnailProbe {
    async fn fetch_size(&self, url: &str) -> Result<u64, ProbeFailure> {
        if is_remote(url) {
            self.fetch_remote(url).await
        } else {
            file_size(Path::new(url)).await
        }
    }
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

async fn file_size(path: &Path) -> Result<u64, ProbeFailure> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| ProbeFailure::Request(format!("{}: {}", path.display(), e)))?;
    if metadata.len() == 0 {
        return Err(ProbeFailure::Empty);
    }
    Ok(metadata.len())
}

/// A directory of previously downloaded thumbnails named `{video_id}.jpg`.
#[derive(Debug, Clone)]
pub struct LocalThumbnails {
    dir: PathBuf,
}

impl LocalThumbnails {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, video_id: &str) -> PathBuf {
        self.dir.join(format!("{}.jpg", video_id))
    }

    /// Size of the local thumbnail of `video_id`, if one exists and is not empty.
    pub async fn size_of(&self, video_id: &str) -> Option<u64> {
        file_size(&self.path_for(video_id)).await.ok()
    }
}

/// Measures the reference placeholder image.
///
/// Returns `None` when it cannot be measured; callers must abort full
/// validation in that case.
pub async fn measure_placeholder<P: ThumbnailProbe + ?Sized>(
    probe: &P,
    location: &str,
) -> Option<u64> {
    match probe.fetch_size(location).await {
        Ok(size) if size > 0 => {
            debug!("Placeholder thumbnail size: {} bytes", size);
            Some(size)
        }
        Ok(_) => {
            warn!("Placeholder thumbnail {} is empty", location);
            None
        }
        Err(e) => {
            warn!("Could not measure placeholder thumbnail {}: {}", location, e);
            None
        }
    }
}
