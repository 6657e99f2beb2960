//! Extraction of external video identifiers from video links.

use lazy_static::lazy_static;
use regex::Regex;

/// Length of a valid external video identifier.
pub const VIDEO_ID_LEN: usize = 11;

lazy_static! {
    /// Covers watch?v=, &v=, short links, embed/ and the legacy v/ and u/x/ paths.
    static ref VIDEO_URL: Regex =
        Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*").unwrap();
}

/// Returns the 11-character identifier of a video link, or `None`.
///
/// A bare 11-character token without any `/` is accepted as an identifier.
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    if let Some(captures) = VIDEO_URL.captures(url) {
        if let Some(id) = captures.get(2) {
            if id.as_str().chars().count() == VIDEO_ID_LEN {
                return Some(id.as_str().to_string());
            }
        }
    }

    if url.chars().count() == VIDEO_ID_LEN && !url.contains('/') {
        return Some(url.to_string());
    }

    None
}
