//! Derived catalog entities produced by the normalizer.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A playable music video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Song {
    /// 11-character external video identifier.
    pub id: String,
    /// Cleaned title.
    pub title: String,
    pub artist_name: String,
    pub artist_mbid: String,
    pub youtube_url: String,
    pub track_thumb: Option<String>,
}

impl Song {
    /// Random selection only considers songs that are complete enough to be
    /// shown and played.
    pub fn is_playable(&self) -> bool {
        !self.id.is_empty()
            && !self.youtube_url.is_empty()
            && self.track_thumb.as_deref().is_some_and(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artist {
    pub artist_name: String,
    pub artist_mbid: String,
    /// Thumbnail of the first kept video, in original list order.
    pub artist_thumb: Option<String>,
    pub video_count: usize,
}

/// One search hit, artists are listed before songs.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchHit {
    Artist(Artist),
    Song(Song),
}

/// The final artist and song collections.
///
/// Built once per normalizer pass and replaced wholesale, never mutated.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Catalog {
    artists: Vec<Artist>,
    songs: Vec<Song>,
}

impl Catalog {
    /// Builds a catalog, sorting both collections by name/title.
    pub fn new(mut artists: Vec<Artist>, mut songs: Vec<Song>) -> Self {
        artists.sort_by(|a, b| compare_names(&a.artist_name, &b.artist_name));
        songs.sort_by(|a, b| compare_names(&a.title, &b.title));
        Self { artists, songs }
    }

    pub fn artists(&self) -> &[Artist] {
        &self.artists
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn get_artists_count(&self) -> usize {
        self.artists.len()
    }

    pub fn get_songs_count(&self) -> usize {
        self.songs.len()
    }

    pub fn get_song(&self, id: &str) -> Option<&Song> {
        self.songs.iter().find(|s| s.id == id)
    }

    pub fn get_artist(&self, mbid: &str) -> Option<&Artist> {
        self.artists.iter().find(|a| a.artist_mbid == mbid)
    }

    pub fn songs_by_artist(&self, mbid: &str) -> Vec<&Song> {
        self.songs.iter().filter(|s| s.artist_mbid == mbid).collect()
    }

    pub fn playable_songs(&self) -> Vec<&Song> {
        self.songs.iter().filter(|s| s.is_playable()).collect()
    }

    /// Case-insensitive substring search. Artists match on name, songs on
    /// title or artist name. An empty term yields nothing.
    pub fn search(&self, term: &str) -> Vec<SearchHit> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .artists
            .iter()
            .filter(|a| a.artist_name.to_lowercase().contains(&term))
            .cloned()
            .map(SearchHit::Artist)
            .collect();

        hits.extend(
            self.songs
                .iter()
                .filter(|s| {
                    s.title.to_lowercase().contains(&term)
                        || s.artist_name.to_lowercase().contains(&term)
                })
                .cloned()
                .map(SearchHit::Song),
        );

        // Both halves are already sorted by name, the stable sort keeps that.
        hits.sort_by_key(|h| match h {
            SearchHit::Artist(_) => 0,
            SearchHit::Song(_) => 1,
        });
        hits
    }
}

/// Case and accent insensitive ordering with a deterministic tie-break on the
/// raw text.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(&sort_key(b)).then_with(|| a.cmp(b))
}

fn sort_key(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(base_letter)
        .collect()
}

/// Maps accented latin letters to their base letter.
fn base_letter(c: char) -> char {
    match c {
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ĥ' | 'ħ' => 'h',
        'ì'..='ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ĵ' => 'j',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò'..='ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ţ' | 'ť' | 'ŧ' => 't',
        'ù'..='ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}
