mod file_config;

pub use file_config::{ControllerConfig, FileConfig, NormalizerConfig, PlayerConfig};

use crate::catalog::{NormalizerSettings, ValidationMode, DEFAULT_BATCH_SIZE};
use crate::playback::ControllerSettings;
use crate::player::PlayerSettings;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub catalog: Option<String>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub validation: ValidationMode,
    pub thumbnail_timeout_sec: u64,
    pub placeholder: Option<String>,
    pub local_thumbnails_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// File path or http(s) url of the raw catalog.
    pub catalog: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub validation: ValidationMode,
    pub thumbnail_timeout_sec: u64,

    pub normalizer: NormalizerSettings,
    pub player: PlayerSettings,
    pub controller: ControllerSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let catalog = file
            .catalog
            .or_else(|| cli.catalog.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("catalog must be specified via --catalog or in config file")
            })?;
        let is_remote = catalog.starts_with("http://") || catalog.starts_with("https://");
        if !is_remote && !PathBuf::from(&catalog).is_file() {
            bail!("Catalog file does not exist: {:?}", catalog);
        }

        let port = file.port.unwrap_or(cli.port);
        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());
        let validation = file
            .validation
            .and_then(|s| ValidationMode::from_str(&s, true).ok())
            .unwrap_or(cli.validation);
        let thumbnail_timeout_sec = file
            .thumbnail_timeout_sec
            .unwrap_or(cli.thumbnail_timeout_sec);

        let normalizer_file = file.normalizer.unwrap_or_default();
        let defaults = NormalizerSettings::default();
        let batch_size = normalizer_file.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            bail!("normalizer.batch_size must be greater than 0");
        }
        let local_thumbnails_dir = normalizer_file
            .local_thumbnails_dir
            .map(PathBuf::from)
            .or_else(|| cli.local_thumbnails_dir.clone());
        if let Some(dir) = &local_thumbnails_dir {
            if !dir.is_dir() {
                bail!("Local thumbnails directory is not a directory: {:?}", dir);
            }
        }
        let normalizer = NormalizerSettings {
            batch_size,
            local_thumbnails_dir,
            placeholder: normalizer_file
                .placeholder
                .or_else(|| cli.placeholder.clone())
                .unwrap_or(defaults.placeholder),
        };

        let player_file = file.player.unwrap_or_default();
        let player_defaults = PlayerSettings::default();
        let player = PlayerSettings {
            init_timeout: player_file
                .init_timeout_sec
                .map(Duration::from_secs)
                .unwrap_or(player_defaults.init_timeout),
            unmute_delay: player_file
                .unmute_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(player_defaults.unmute_delay),
        };

        let controller_file = file.controller.unwrap_or_default();
        let controller_defaults = ControllerSettings::default();
        let controller = ControllerSettings {
            skip_fade_ms: controller_file
                .skip_fade_ms
                .unwrap_or(controller_defaults.skip_fade_ms),
            error_advance_delay: controller_file
                .error_advance_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(controller_defaults.error_advance_delay),
        };

        Ok(Self {
            catalog,
            port,
            logging_level,
            validation,
            thumbnail_timeout_sec,
            normalizer,
            player,
            controller,
        })
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
