//! Command-line entry point.
//!
//! # Startup sequence
//!
//! 1. Initialise logging (`RUST_LOG`, default `info`).
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Apply command-line overrides.
//! 4. Run the subcommand; network work runs on a [`tokio`] runtime.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use meeting_audio::{
    audio::RawAudio,
    compress::{ClassifierPolicy, CompressionOptions, Compressor},
    config::{AppConfig, AppPaths},
    upload::{prepare_upload_async, AnalysisUploader, FileValidator, HttpUploader},
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "meeting-audio")]
#[command(about = "Compress meeting recordings to MP3 and send them for analysis")]
#[command(version)]
struct Cli {
    /// Settings file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Re-encode a recording as MP3 and print size statistics
    Compress {
        input: PathBuf,

        /// Output file (defaults to the input name with an .mp3 extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        encode: EncodeArgs,

        /// Compress even when the input is already a compact format
        #[arg(long)]
        force: bool,
    },

    /// Validate, compress if needed, and upload a recording for analysis
    Analyze {
        input: PathBuf,

        /// Analysis endpoint URL
        #[arg(long)]
        endpoint: Option<String>,

        /// Recording duration in seconds, forwarded to the backend
        #[arg(long)]
        duration: Option<f64>,

        #[command(flatten)]
        encode: EncodeArgs,
    },

    /// Show the settings file location and effective settings
    Config {
        /// Write default settings to the settings file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
struct EncodeArgs {
    /// MP3 bitrate in kbps
    #[arg(long)]
    bitrate: Option<u32>,

    /// Output sample-rate cap in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Output channels (1 or 2)
    #[arg(long)]
    channels: Option<u16>,

    /// Encoder quality, 1 (best) to 9 (fastest)
    #[arg(long)]
    quality: Option<u8>,
}

impl EncodeArgs {
    fn apply(&self, mut options: CompressionOptions) -> CompressionOptions {
        if let Some(v) = self.bitrate {
            options.bit_rate_kbps = v;
        }
        if let Some(v) = self.sample_rate {
            options.sample_rate_hz = v;
        }
        if let Some(v) = self.channels {
            options.channels = v;
        }
        if let Some(v) = self.quality {
            options.quality_level = v;
        }
        options
    }
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn run_compress(
    config: &AppConfig,
    input: &Path,
    output: Option<PathBuf>,
    options: CompressionOptions,
    force: bool,
) -> Result<()> {
    let audio =
        RawAudio::from_path(input).with_context(|| format!("reading {}", input.display()))?;
    let compressor = Compressor::new().with_policy(ClassifierPolicy::from(&config.classifier));

    if !force && !compressor.should_compress(&audio) {
        log::info!(
            "{} ({}) is already compact; use --force to re-encode",
            input.display(),
            audio.mime_type
        );
        return Ok(());
    }

    let result = compressor.compress_unconditionally(&audio, &options)?;
    let output = output.unwrap_or_else(|| default_output(input));
    std::fs::write(&output, &result.compressed_blob.bytes)
        .with_context(|| format!("writing {}", output.display()))?;

    log::info!("wrote {}: {}", output.display(), result);
    println!("{}", serde_json::to_string_pretty(&result.stats())?);
    Ok(())
}

async fn run_analyze(
    config: &AppConfig,
    input: &Path,
    duration: Option<f64>,
    options: CompressionOptions,
) -> Result<()> {
    let audio =
        RawAudio::from_path(input).with_context(|| format!("reading {}", input.display()))?;
    let file_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("recording")
        .to_string();

    let details = FileValidator::from_config(&config.upload).validate(
        &file_name,
        audio.size_bytes,
        &audio.mime_type,
    )?;
    log::info!("validated {} ({} MB, {})", details.name, details.size_mb, details.mime_type);

    let compressor = Compressor::new().with_policy(ClassifierPolicy::from(&config.classifier));
    let prepared = prepare_upload_async(&compressor, audio, &file_name, options).await;
    log::info!("prepared {} ({:?})", prepared.file_name, prepared.outcome);

    let analysis = HttpUploader::from_config(&config.upload)
        .upload(&prepared, duration)
        .await?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

fn run_config(config: &AppConfig, path: &Path, init: bool) -> Result<()> {
    if init {
        AppConfig::default().save_to(path)?;
        log::info!("wrote default settings to {}", path.display());
    }
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// `meeting.wav` → `meeting.mp3`; an `.mp3` input gets `meeting.compressed.mp3`.
fn default_output(input: &Path) -> PathBuf {
    let candidate = input.with_extension("mp3");
    if candidate == input {
        input.with_extension("compressed.mp3")
    } else {
        candidate
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // 2. Config
    let settings_path = cli.config.unwrap_or_else(|| AppPaths::new().settings_file);
    let mut config = AppConfig::load_from(&settings_path)
        .with_context(|| format!("loading {}", settings_path.display()))?;
    log::debug!("config loaded from {}", settings_path.display());

    // 3 + 4. Overrides and dispatch
    match cli.command {
        Command::Compress {
            input,
            output,
            encode,
            force,
        } => {
            let options = encode.apply(CompressionOptions::from(&config.compression));
            run_compress(&config, &input, output, options, force)
        }

        Command::Analyze {
            input,
            endpoint,
            duration,
            encode,
        } => {
            if let Some(url) = endpoint {
                config.upload.endpoint = url;
            }
            let options = encode.apply(CompressionOptions::from(&config.compression));

            let rt = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .context("failed to create tokio runtime")?;
            rt.block_on(run_analyze(&config, &input, duration, options))
        }

        Command::Config { init } => {
            if init {
                config = AppConfig::default();
            }
            run_config(&config, &settings_path, init)
        }
    }
}
