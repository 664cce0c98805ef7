//! CLI entry point for the extraction-watcher tool.
//!
//! This binary watches a drop directory for extraction output and archives
//! it incrementally: files that stop changing are zipped whole into a
//! rotating archive family, while large still-growing files are streamed
//! into per-file archives one chunk at a time.
//!
//! # Usage
//!
//! ```bash
//! # Watch /tmp/input with all defaults
//! extraction-watcher
//!
//! # Custom directories and a 5 MiB chunk size
//! extraction-watcher \
//!     --input-dir /data/extracts \
//!     --output-dir /data/archives \
//!     --chunk-size-bytes 5242880
//! ```
//!
//! The process runs until Ctrl-C or SIGTERM, then seals every open archive
//! before exiting.

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::time::{SystemTime, UNIX_EPOCH};

use camino::Utf8PathBuf;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use xw_archive::ExtractionEngine;
use xw_core::{ArchiveConfig, Config, WatchConfig};
use xw_watcher::{AcceptAllFilter, DirectoryWatcher};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Watches a directory and incrementally archives its files.
///
/// Stable files are added whole to a rotating zip family; large growing
/// files are chunked into dedicated per-file archives as they grow.
#[derive(Parser)]
#[command(name = "extraction-watcher", version, about, long_about = None)]
struct Cli {
    /// Directory to watch for incoming files.
    #[arg(short, long, env = "XW_INPUT_DIR", default_value = "/tmp/input")]
    input_dir: Utf8PathBuf,

    /// Directory to write archives into (created if missing).
    #[arg(short, long, env = "XW_OUTPUT_DIR", default_value = "/tmp/output")]
    output_dir: Utf8PathBuf,

    /// Base filename of the rotating stable-file archive.
    #[arg(long, env = "XW_STABLE_ZIP_NAME", default_value = "stables.zip")]
    stable_zip_name: String,

    /// Prefix prepended to every output archive filename.
    ///
    /// Defaults to the process start time in epoch seconds followed by an
    /// underscore, so repeated runs never clobber each other's output.
    #[arg(long, env = "XW_OUTPUT_PREFIX")]
    output_prefix: Option<String>,

    /// Interval between directory scans in milliseconds.
    #[arg(long, env = "XW_POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Consecutive unchanged polls before a file is considered stable.
    #[arg(long, env = "XW_STABILITY_POLLS", default_value_t = 2)]
    stability_polls: u32,

    /// Stable archive size in bytes that triggers rotation to the next part.
    #[arg(long, env = "XW_ROTATE_THRESHOLD_BYTES", default_value_t = 20 * 1024 * 1024)]
    rotate_threshold_bytes: u64,

    /// Minimum size in bytes for a growing file to be chunk-archived.
    #[arg(long, env = "XW_LARGE_FILE_THRESHOLD_BYTES", default_value_t = 20 * 1024 * 1024)]
    large_file_threshold_bytes: u64,

    /// Chunk granularity in bytes for growing files.
    #[arg(long, env = "XW_CHUNK_SIZE_BYTES", default_value_t = 20 * 1024 * 1024)]
    chunk_size_bytes: u64,

    /// Number of entry additions between forced commits of the stable archive.
    #[arg(long, env = "XW_COMMIT_EVERY", default_value_t = 100)]
    commit_every: u64,

    /// Enable verbose logging (debug level).
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
///
/// # Arguments
///
/// * `verbose` - Enable debug-level logging
/// * `no_color` - Disable ANSI colors in output
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},mio=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

/// Returns the default output prefix: process start time in epoch seconds.
fn default_output_prefix() -> String {
    let epoch_seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{epoch_seconds}_")
}

/// Builds a [`Config`] from CLI arguments.
///
/// Validates that the input directory exists and creates the output
/// directory if it is missing.
///
/// # Errors
///
/// Returns an error if the input directory doesn't exist or isn't a
/// directory, if the output directory cannot be created, or if any
/// option fails validation.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    if !cli.input_dir.exists() {
        return Err(color_eyre::eyre::eyre!(
            "Input directory does not exist: {}",
            cli.input_dir
        ));
    }
    if !cli.input_dir.is_dir() {
        return Err(color_eyre::eyre::eyre!(
            "Input path is not a directory: {}",
            cli.input_dir
        ));
    }

    std::fs::create_dir_all(cli.output_dir.as_std_path())?;

    let config = Config {
        archive: ArchiveConfig {
            input_dir: cli.input_dir.clone(),
            output_dir: cli.output_dir.clone(),
            stable_archive_name: cli.stable_zip_name.clone(),
            output_prefix: cli
                .output_prefix
                .clone()
                .unwrap_or_else(default_output_prefix),
            commit_every: cli.commit_every,
            rotate_threshold_bytes: cli.rotate_threshold_bytes,
            large_file_threshold_bytes: cli.large_file_threshold_bytes,
            chunk_bytes: cli.chunk_size_bytes,
        },
        watch: WatchConfig {
            poll_interval_ms: cli.poll_interval_ms,
            stability_polls: cli.stability_polls,
        },
    };
    config.validate()?;

    Ok(config)
}

// =============================================================================
// EVENT LOOP
// =============================================================================

/// Completes when the process receives Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = sigterm.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

/// Runs the watch-and-archive loop until a shutdown signal arrives.
///
/// Engine errors are logged with their event and the loop continues: a
/// vanished source file keeps failing on every event for that path, and
/// skipping it must not stall archival of everything else.
///
/// # Errors
///
/// Returns an error if the engine or watcher cannot be created, or if
/// sealing the archives fails during shutdown.
async fn run(config: Config) -> color_eyre::Result<()> {
    let mut engine = ExtractionEngine::new(&config.archive)?;
    let mut watcher =
        DirectoryWatcher::new(&config.archive.input_dir, &config.watch, AcceptAllFilter).await?;

    info!(
        input = %config.archive.input_dir,
        output = %config.archive.output_dir,
        prefix = %config.archive.output_prefix,
        "extraction watcher running"
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            maybe_event = watcher.recv() => {
                match maybe_event {
                    Some(event) => {
                        if let Err(err) = engine.on_event(&event) {
                            error!(event = %event, error = %err, "failed to archive event");
                        }
                    }
                    None => {
                        warn!("watcher channel closed, shutting down");
                        break;
                    }
                }
            }
            result = &mut shutdown => {
                if let Err(err) = result {
                    warn!(error = %err, "signal handler failed, shutting down anyway");
                }
                info!("shutdown signal received");
                break;
            }
        }
    }

    stop_and_seal(watcher, &mut engine).await?;

    info!("all archives sealed");

    Ok(())
}

/// Stops the watcher, then seals every open archive.
///
/// The flush runs even if stopping the watcher fails; skipping it would
/// leave every open archive structurally incomplete, which is worse than
/// any shutdown error.
///
/// # Errors
///
/// Returns the flush error if sealing fails, otherwise any error from the
/// watcher task.
async fn stop_and_seal(
    watcher: DirectoryWatcher,
    engine: &mut ExtractionEngine,
) -> color_eyre::Result<()> {
    let shutdown_result = watcher.shutdown().await;
    engine.flush()?;
    shutdown_result?;
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // Install color-eyre first, before any potential panics
    color_eyre::install()?;

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.no_color);

    let config = build_config(&cli)?;
    run(config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use xw_core::{Event, EventKind};

    #[tokio::test]
    async fn test_stop_and_seal_flushes_archives() {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 path");
        let input = root.join("in");
        let output = root.join("out");
        std::fs::create_dir(&input).expect("create input");
        std::fs::create_dir(&output).expect("create output");

        let source = input.join("done.csv");
        std::fs::write(&source, "complete").expect("write source");

        let config = Config {
            archive: ArchiveConfig {
                input_dir: input.clone(),
                output_dir: output.clone(),
                ..ArchiveConfig::default()
            },
            watch: WatchConfig::default(),
        };

        let mut engine = ExtractionEngine::new(&config.archive).expect("engine");
        engine
            .on_event(&Event::new(EventKind::Stable, source, 8))
            .expect("stable event");

        let watcher = DirectoryWatcher::new(&input, &config.watch, AcceptAllFilter)
            .await
            .expect("watcher");

        stop_and_seal(watcher, &mut engine)
            .await
            .expect("stop and seal");

        // The stable archive was sealed and parses cleanly
        let file = std::fs::File::open(output.join("stables.zip")).expect("open archive");
        let archive = zip::ZipArchive::new(file).expect("parse archive");
        assert_eq!(archive.len(), 1);
    }
}
