//! Song title cleaning.
//!
//! Scraped video titles carry a lot of noise ("Artist - Song (Official Video)
//! [HD]"). The jukebox only wants to show the song name.

use lazy_static::lazy_static;
use regex::Regex;

/// Boilerplate tokens removed as whole words, longest first so that
/// "Official Music Video" goes away in one piece.
const BOILERPLATE_TOKENS: &[&str] = &[
    "Official Music Video",
    "Official Lyric Video",
    "Official Video",
    "Official Audio",
    "Music Video",
    "Lyric Video",
    "Official",
    "Audio",
    "Video",
    "HD",
    "4K",
    "HQ",
];

lazy_static! {
    static ref BRACKETED: Regex = Regex::new(r"\[.*?\]|\(.*?\)|\{.*?\}").unwrap();
    static ref BOILERPLATE: Regex = {
        let alternatives = BOILERPLATE_TOKENS
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives)).unwrap()
    };
    static ref DASH_SUFFIX: Regex = Regex::new(r"\s+-(?:\s.*)?$").unwrap();
    static ref SEPARATORS: Regex = Regex::new(r"[|/\\]").unwrap();
    static ref EDGE_NOISE: Regex = Regex::new(r"^[^\p{L}\p{N}]+|[^\p{L}\p{N}]+$").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Cleans a scraped title for display.
///
/// Never returns an empty string for a non-empty title: when cleaning strips
/// everything, the original title is returned untouched.
pub fn clean_title(title: &str, artist_name: &str) -> String {
    if title.trim().is_empty() {
        return title.to_string();
    }

    let mut cleaned = BRACKETED.replace_all(title, "").trim().to_string();
    cleaned = BOILERPLATE.replace_all(&cleaned, "").trim().to_string();
    cleaned = strip_artist_name(&cleaned, artist_name);
    cleaned = DASH_SUFFIX.replace(&cleaned, "").trim().to_string();
    cleaned = SEPARATORS.replace_all(&cleaned, " ").trim().to_string();
    cleaned = EDGE_NOISE.replace_all(&cleaned, "").trim().to_string();
    cleaned = WHITESPACE.replace_all(&cleaned, " ").trim().to_string();

    if cleaned.is_empty() {
        title.to_string()
    } else {
        cleaned
    }
}

fn strip_artist_name(title: &str, artist_name: &str) -> String {
    let artist_name = artist_name.trim();
    if artist_name.is_empty() {
        return title.to_string();
    }
    let pattern = format!(r"(?i)(^|\W){}(\W|$)", regex::escape(artist_name));
    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(title, "${1}${2}").trim().to_string(),
        // Names long enough to blow the regex size limit are left in place.
        Err(_) => title.to_string(),
    }
}
