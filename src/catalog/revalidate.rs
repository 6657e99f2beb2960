//! On-demand full validation of an already loaded raw catalog.

use super::models::Catalog;
use super::normalizer::{
    normalize, NormalizerSettings, ValidationError, ValidationMode, ValidationStats,
};
use super::raw::RawArtistRecord;
use super::thumbnail::ThumbnailProbe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Runs full validation passes over the raw catalog, one at a time.
pub struct Revalidator {
    raw: Arc<Vec<RawArtistRecord>>,
    probe: Arc<dyn ThumbnailProbe>,
    settings: NormalizerSettings,
    running: AtomicBool,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Revalidator {
    pub fn new(
        raw: Arc<Vec<RawArtistRecord>>,
        probe: Arc<dyn ThumbnailProbe>,
        settings: NormalizerSettings,
    ) -> Self {
        Self {
            raw,
            probe,
            settings,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Validates every video again and returns the rebuilt catalog.
    ///
    /// Fails with [`ValidationError::AlreadyRunning`] while another run is in
    /// progress.
    pub async fn run(&self) -> Result<(Catalog, ValidationStats), ValidationError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ValidationError::AlreadyRunning);
        }
        let _guard = RunningGuard(&self.running);

        info!("Starting validation of {} artists", self.raw.len());
        let normalized = normalize(
            &self.raw,
            ValidationMode::Full,
            self.probe.as_ref(),
            &self.settings,
            |progress| {
                info!(
                    "Checking thumbnails: {}% ({}/{})",
                    progress.percent, progress.processed, progress.total
                );
            },
        )
        .await?;

        Ok((normalized.catalog, normalized.stats.unwrap_or_default()))
    }
}
