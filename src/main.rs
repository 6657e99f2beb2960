use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use video_jukebox::catalog::{
    load_raw_catalog, normalize, HttpThumbnailProbe, Revalidator, ThumbnailProbe, ValidationMode,
};
use video_jukebox::channel::{CommandSender, PlayerLink, SharedStore};
use video_jukebox::config::{AppConfig, CliConfig, FileConfig};
use video_jukebox::playback::{Controller, ControllerService, Selector, SharedController};
use video_jukebox::player::PlayerMachine;
use video_jukebox::server::{run_server, RequestsLoggingLevel, ServerConfig, ServerState};
use video_jukebox::WidgetBridge;

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path or http(s) url of the raw catalog JSON.
    #[clap(long)]
    pub catalog: Option<String>,

    /// Path to a TOML config file. Values found there override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Whether to check every video thumbnail before serving the catalog.
    #[clap(long, value_enum, default_value_t = ValidationMode::Skip)]
    pub validation: ValidationMode,

    /// Timeout in seconds for each thumbnail request.
    #[clap(long, default_value_t = 10)]
    pub thumbnail_timeout_sec: u64,

    /// Path or url of the generic placeholder thumbnail.
    #[clap(long)]
    pub placeholder: Option<String>,

    /// Directory of previously downloaded `{video_id}.jpg` thumbnails.
    #[clap(long, value_parser = parse_path)]
    pub local_thumbnails_dir: Option<PathBuf>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            catalog: self.catalog.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            validation: self.validation,
            thumbnail_timeout_sec: self.thumbnail_timeout_sec,
            placeholder: self.placeholder.clone(),
            local_thumbnails_dir: self.local_thumbnails_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Loading catalog from {}...", config.catalog);
    let raw = load_raw_catalog(&config.catalog)
        .await
        .with_context(|| format!("Failed to load catalog from {}", config.catalog))?;

    let probe: Arc<dyn ThumbnailProbe> =
        Arc::new(HttpThumbnailProbe::new(config.thumbnail_timeout_sec)?);
    let normalized = normalize(
        &raw,
        config.validation,
        probe.as_ref(),
        &config.normalizer,
        |progress| {
            info!(
                "Checking thumbnails: {}% ({}/{})",
                progress.percent, progress.processed, progress.total
            );
        },
    )
    .await?;
    if let Some(stats) = normalized.stats {
        info!(
            "Thumbnails: {} valid, {} placeholder, {} failed, {} missing data",
            stats.valid, stats.placeholder, stats.fetch_failed, stats.missing_data
        );
    }

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
        config.player.clone(),
    );

    let controller = Controller::new(
        normalized.catalog,
        CommandSender::new(store.clone(), link),
        Selector::new(),
        config.controller.clone(),
    );
    let controller: SharedController = Arc::new(tokio::sync::Mutex::new(controller));

    // Subscribe to statuses before the player can report ready.
    let service_handle = ControllerService::new(controller.clone(), &store).spawn(shutdown.clone());

    let player_handle = player.spawn(shutdown.clone());
    tokio::spawn(async move {
        match player_handle.await {
            Ok(Ok(())) => info!("Player stopped"),
            Ok(Err(err)) => error!("Player failed: {}", err),
            Err(err) => error!("Player task panicked: {}", err),
        }
    });

    if let Err(err) = controller.lock().await.start() {
        error!("Could not start playback: {}", err);
    }

    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down...");
            ctrl_c_shutdown.cancel();
        }
    });

    let revalidator = Arc::new(Revalidator::new(
        Arc::new(raw),
        probe,
        config.normalizer.clone(),
    ));
    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
    };
    let state = ServerState::new(server_config, controller, revalidator, widget_bridge);

    let result = run_server(state, shutdown.clone()).await;
    shutdown.cancel();
    let _ = service_handle.await;
    result
}
