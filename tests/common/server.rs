//! Test server lifecycle management
//!
//! Spawns the whole jukebox (controller, player machine and HTTP surface) on
//! a random port. The player widget is the WebSocket bridge, driven by a
//! [`PlayerPage`](super::PlayerPage) standing in for the browser page.

use super::constants::*;
use super::fixtures::create_test_catalog;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use video_jukebox::catalog::{
    load_raw_catalog, normalize_without_validation, HttpThumbnailProbe, NormalizerSettings,
    Revalidator, ThumbnailProbe,
};
use video_jukebox::channel::{CommandSender, PlayerLink, SharedStore};
use video_jukebox::playback::{
    Controller, ControllerService, ControllerSettings, Selector, SharedController,
};
use video_jukebox::player::{PlayerMachine, PlayerSettings};
use video_jukebox::server::{make_app, RequestsLoggingLevel, ServerConfig, ServerState};
use video_jukebox::WidgetBridge;

/// Test server instance with an isolated catalog
///
/// When dropped, every background task is cancelled and temp files are removed.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Direct access to the controller, for assertions
    pub controller: SharedController,

    // Private fields - keep resources alive until drop
    _temp_catalog_dir: TempDir,
    shutdown: CancellationToken,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the catalog cannot be created or loaded, if port binding
    /// fails, or if the server doesn't become ready within timeout.
    pub async fn spawn() -> Self {
        let (temp_catalog_dir, catalog_path) =
            create_test_catalog().expect("Failed to create test catalog");
        let raw = load_raw_catalog(&catalog_path.to_string_lossy())
            .await
            .expect("Failed to load test catalog");
        let catalog = normalize_without_validation(&raw);

        let shutdown = CancellationToken::new();
        let store = SharedStore::new();
        let link = PlayerLink::new();

        let (widget_bridge, widget_events) = WidgetBridge::new();
        let player = PlayerMachine::new(
            widget_bridge.clone(),
            widget_bridge.clone(),
            widget_events,
            &store,
            link.clone(),
            PlayerSettings {
                init_timeout: Duration::from_secs(30),
                unmute_delay: Duration::from_millis(10),
            },
        );

        let controller = Controller::new(
            catalog,
            CommandSender::new(store.clone(), link),
            Selector::seeded(42),
            ControllerSettings {
                skip_fade_ms: TEST_SKIP_FADE_MS,
                error_advance_delay: Duration::from_millis(100),
            },
        );
        let controller: SharedController = Arc::new(tokio::sync::Mutex::new(controller));

        ControllerService::new(controller.clone(), &store).spawn(shutdown.clone());
        player.spawn(shutdown.clone());
        controller
            .lock()
            .await
            .start()
            .expect("Failed to start playback");

        let probe: Arc<dyn ThumbnailProbe> =
            Arc::new(HttpThumbnailProbe::new(1).expect("Failed to build probe"));
        let revalidator = Arc::new(Revalidator::new(
            Arc::new(raw),
            probe,
            NormalizerSettings::default(),
        ));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
        };
        let state = ServerState::new(config, controller.clone(), revalidator, widget_bridge);
        let app = make_app(state).expect("Failed to build app");

        let server_shutdown = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            controller,
            _temp_catalog_dir: temp_catalog_dir,
            shutdown,
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/v1/player/ws", self.port)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
