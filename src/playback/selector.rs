//! Picks what plays next: the queue head, or a random playable song.

use super::queue::{PlayQueue, QueueEntry};
use crate::catalog::Catalog;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionSource {
    Queue,
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub entry: QueueEntry,
    pub source: SelectionSource,
}

pub struct Selector {
    rng: StdRng,
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

impl Selector {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic selector for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Pops the queue head, or picks uniformly among playable songs.
    pub fn select_next(&mut self, queue: &mut PlayQueue, catalog: &Catalog) -> Option<Selection> {
        if let Some(entry) = queue.pop() {
            return Some(Selection {
                entry,
                source: SelectionSource::Queue,
            });
        }

        let playable = catalog.playable_songs();
        let song = playable.choose(&mut self.rng)?;
        Some(Selection {
            entry: QueueEntry {
                id: song.id.clone(),
                title: song.title.clone(),
                artist: song.artist_name.clone(),
            },
            source: SelectionSource::Random,
        })
    }
}
