use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub catalog: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub validation: Option<String>,
    pub thumbnail_timeout_sec: Option<u64>,

    // Feature configs
    pub normalizer: Option<NormalizerConfig>,
    pub player: Option<PlayerConfig>,
    pub controller: Option<ControllerConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct NormalizerConfig {
    pub batch_size: Option<usize>,
    /// Path or url of the placeholder thumbnail image.
    pub placeholder: Option<String>,
    pub local_thumbnails_dir: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct PlayerConfig {
    pub init_timeout_sec: Option<u64>,
    pub unmute_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ControllerConfig {
    pub skip_fade_ms: Option<u64>,
    pub error_advance_delay_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
