//! Audio fade-out task.

use super::widget::VideoWidget;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const FADE_TICK: Duration = Duration::from_millis(50);

/// Number of volume steps for a fade of `duration_ms`, at least one.
pub fn fade_steps(duration_ms: u64) -> u64 {
    let tick = FADE_TICK.as_millis() as u64;
    duration_ms.div_ceil(tick).max(1)
}

/// Sent once the fade ran to completion; never sent for a cancelled fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeFinished {
    pub generation: u64,
}

/// Ramps the volume from `start_volume` to 0 over `duration_ms`.
///
/// Stopping the widget is left to the receiver of [`FadeFinished`], which
/// knows whether the fade is still the current one.
pub fn spawn_fade(
    widget: Arc<dyn VideoWidget>,
    start_volume: u8,
    duration_ms: u64,
    generation: u64,
    cancel: CancellationToken,
    done: mpsc::Sender<FadeFinished>,
) {
    tokio::spawn(async move {
        let steps = fade_steps(duration_ms);
        debug!(
            "Fading: duration={}ms, start volume={}, steps={}",
            duration_ms, start_volume, steps
        );

        let mut interval = tokio::time::interval(FADE_TICK);
        // The first tick completes immediately.
        interval.tick().await;

        for step in 1..=steps {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Fade cancelled at step {}/{}", step, steps);
                    return;
                }
                _ = interval.tick() => {}
            }
            if step < steps {
                let remaining = start_volume as u64 * (steps - step) / steps;
                widget.set_volume(remaining as u8).await;
            }
        }

        if cancel.is_cancelled() {
            return;
        }
        widget.set_volume(0).await;
        debug!("Audio fade out complete");
        let _ = done.send(FadeFinished { generation }).await;
    });
}
