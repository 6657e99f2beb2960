use axum::extract::FromRef;

use crate::catalog::Revalidator;
use crate::playback::SharedController;
use std::sync::Arc;
use std::time::Instant;

use super::widget_bridge::WidgetBridge;
use super::ServerConfig;

pub type GuardedRevalidator = Arc<Revalidator>;
pub type GuardedWidgetBridge = Arc<WidgetBridge>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub controller: SharedController,
    pub revalidator: GuardedRevalidator,
    pub widget_bridge: GuardedWidgetBridge,
    pub hash: String,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        controller: SharedController,
        revalidator: GuardedRevalidator,
        widget_bridge: GuardedWidgetBridge,
    ) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            controller,
            revalidator,
            widget_bridge,
            hash: env!("GIT_HASH").to_string(),
        }
    }
}

impl FromRef<ServerState> for SharedController {
    fn from_ref(input: &ServerState) -> Self {
        input.controller.clone()
    }
}

impl FromRef<ServerState> for GuardedRevalidator {
    fn from_ref(input: &ServerState) -> Self {
        input.revalidator.clone()
    }
}

impl FromRef<ServerState> for GuardedWidgetBridge {
    fn from_ref(input: &ServerState) -> Self {
        input.widget_bridge.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
