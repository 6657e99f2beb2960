//! Offline catalog cleaner.
//!
//! Reads a scraped catalog, checks every video thumbnail and writes a new
//! catalog without the videos that fail, nor the artists left empty.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use video_jukebox::catalog::{
    clean_catalog, load_raw_catalog, write_catalog, HttpThumbnailProbe, NormalizerSettings,
    DEFAULT_BATCH_SIZE,
};

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
    /// Path or http(s) url of the catalog to clean.
    pub input: String,

    /// Where to write the cleaned catalog.
    #[clap(value_parser = parse_path)]
    pub output: PathBuf,

    /// Path or url of the generic placeholder thumbnail.
    #[clap(long, default_value = "generic_youtube_thumbnail.jpg")]
    pub placeholder: String,

    /// Directory of previously downloaded `{video_id}.jpg` thumbnails, checked
    /// before the remote ones.
    #[clap(long, value_parser = parse_path)]
    pub local_thumbnails_dir: Option<PathBuf>,

    /// Number of thumbnails checked concurrently.
    #[clap(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Timeout in seconds for each thumbnail request.
    #[clap(long, default_value_t = 10)]
    pub timeout_sec: u64,
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

    if cli_args.batch_size == 0 {
        bail!("--batch-size must be greater than 0");
    }
    if let Some(dir) = &cli_args.local_thumbnails_dir {
        if !dir.is_dir() {
            bail!("Local thumbnails directory is not a directory: {:?}", dir);
        }
    }

    info!("Loading catalog from {}...", cli_args.input);
    let raw = load_raw_catalog(&cli_args.input)
        .await
        .with_context(|| format!("Failed to load catalog from {}", cli_args.input))?;

    let probe = HttpThumbnailProbe::new(cli_args.timeout_sec)?;
    let settings = NormalizerSettings {
        batch_size: cli_args.batch_size,
        local_thumbnails_dir: cli_args.local_thumbnails_dir,
        placeholder: cli_args.placeholder,
    };

    let cleaned = clean_catalog(&raw, &probe, &settings, |progress| {
        info!(
            "Progress: {}% ({}/{})",
            progress.percent, progress.processed, progress.total
        );
    })
    .await?;

    write_catalog(&cli_args.output, &cleaned.artists)?;

    let stats = cleaned.stats;
    println!("Original artists:  {}", stats.original_artists);
    println!("Original videos:   {}", stats.original_videos);
    println!("Removed artists:   {}", stats.removed_artists);
    println!("Removed videos:    {}", stats.removed_videos);
    println!("Remaining artists: {}", stats.remaining_artists);
    println!("Remaining videos:  {}", stats.remaining_videos);

    Ok(())
}
