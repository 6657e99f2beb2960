//! Catalog file loading, from disk or over HTTP.

use super::raw::RawArtistRecord;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("HTTP error {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("Expected JSON from {url} but got content type {content_type:?}")]
    NotJson { url: String, content_type: String },
    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Catalog top level must be an array")]
    NotAnArray,
}

/// Reads the raw catalog from a file path or an http(s) url.
pub async fn load_raw_catalog(source: &str) -> Result<Vec<RawArtistRecord>, DataError> {
    let text = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_catalog_text(source).await?
    } else {
        read_catalog_text(Path::new(source)).await?
    };
    let artists = parse_raw_catalog(&text)?;
    info!("Loaded {} artists from {}", artists.len(), source);
    Ok(artists)
}

async fn read_catalog_text(path: &Path) -> Result<String, DataError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DataError::Io {
            path: path.display().to_string(),
            source,
        })
}

async fn fetch_catalog_text(url: &str) -> Result<String, DataError> {
    let fetch_error = |e: reqwest::Error| DataError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    };

    let response = reqwest::get(url).await.map_err(fetch_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(DataError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !content_type.contains("application/json") {
        return Err(DataError::NotJson {
            url: url.to_string(),
            content_type,
        });
    }

    response.text().await.map_err(fetch_error)
}

/// Parses catalog JSON text. Elements that are not artist objects are
/// skipped with a warning.
pub fn parse_raw_catalog(text: &str) -> Result<Vec<RawArtistRecord>, DataError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(items) = value else {
        return Err(DataError::NotAnArray);
    };

    let mut artists = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            warn!("Skipping catalog entry #{}: not an object", index);
            continue;
        }
        match serde_json::from_value::<RawArtistRecord>(item) {
            Ok(artist) => artists.push(artist),
            Err(err) => warn!("Skipping catalog entry #{}: {}", index, err),
        }
    }
    Ok(artists)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_array_top_level() {
        assert!(matches!(
            parse_raw_catalog(r#"{"artist_name":"A"}"#),
            Err(DataError::NotAnArray)
        ));
        assert!(matches!(parse_raw_catalog("not json"), Err(DataError::Parse(_))));
    }

    #[test]
    fn skips_malformed_entries() {
        let text = r#"[
            {"artist_name":"A","mbid":"m","music_videos":[]},
            42,
            {"artist_name":["wrong"]},
            {"artist_name":"B","mbid":"n"}
        ]"#;
        let artists = parse_raw_catalog(text).unwrap();
        assert_eq!(artists.len(), 2);
        assert_eq!(artists[1].artist_name(), Some("B"));
    }

    #[tokio::test]
    async fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"[{"artist_name":"A","mbid":"m","music_videos":[]}]"#).unwrap();

        let artists = load_raw_catalog(path.to_str().unwrap()).await.unwrap();
        assert_eq!(artists.len(), 1);

        let missing = load_raw_catalog("/no/such/catalog.json").await;
        assert!(matches!(missing, Err(DataError::Io { .. })));
    }
}
