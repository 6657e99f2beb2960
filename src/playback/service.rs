//! Background task feeding player status reports into the [`Controller`].

use super::controller::{Controller, StatusOutcome};
use crate::channel::{SharedStore, StatusReceiver};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub type SharedController = Arc<Mutex<Controller>>;

pub struct ControllerService {
    controller: SharedController,
    statuses: StatusReceiver,
}

impl ControllerService {
    /// Subscribes to status reports right away so that nothing written after
    /// this call is missed.
    pub fn new(controller: SharedController, store: &SharedStore) -> Self {
        Self {
            controller,
            statuses: StatusReceiver::new(store),
        }
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Controller service started");
        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = self.statuses.next() => next,
            };

            let status = match next {
                Some(Ok(status)) => status,
                Some(Err(err)) => {
                    warn!("Error parsing status event: {}", err);
                    continue;
                }
                None => break,
            };
            debug!("Parsed status: {:?}", status);

            // Held across handling and advancing so no enqueue lands in between.
            let mut controller = self.controller.lock().await;
            match controller.handle_status(status) {
                StatusOutcome::AdvanceNow => {
                    controller.advance();
                }
                StatusOutcome::AdvanceAfter(delay) => {
                    let controller = self.controller.clone();
                    let shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = shutdown.cancelled() => {}
                            _ = tokio::time::sleep(delay) => {
                                controller.lock().await.advance_if_idle();
                            }
                        }
                    });
                }
                StatusOutcome::None => {}
            }
        }
        info!("Controller service stopped");
    }
}
