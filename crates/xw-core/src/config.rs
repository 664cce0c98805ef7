//! Configuration structures for the extraction-watcher tool.
//!
//! This module provides configuration types for all components of the application:
//!
//! - [`ArchiveConfig`] - Archival engine settings (directories, thresholds, sizes)
//! - [`WatchConfig`] - Polling watcher settings (interval, stability window)
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`] with the values the original
//! deployment used: 20 MiB thresholds, one-second polls, and a two-poll
//! stability window.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default archive size thresholds and chunk granularity (20 MiB).
pub const DEFAULT_CHUNK_BYTES: u64 = 20 * 1024 * 1024;

/// Default number of entry additions between forced commits.
pub const DEFAULT_COMMIT_EVERY: u64 = 100;

/// Configuration for the incremental archival engine.
///
/// Controls where archives are written, when the rotating stable archive is
/// sealed and a new part opened, which `modified` events count as "large",
/// and the chunk granularity for growing files.
///
/// # Examples
///
/// ```
/// use xw_core::ArchiveConfig;
///
/// let config = ArchiveConfig::default();
/// assert_eq!(config.stable_archive_name, "stables.zip");
/// assert_eq!(config.commit_every, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Directory watched for incoming files.
    pub input_dir: Utf8PathBuf,

    /// Directory where archives are written.
    pub output_dir: Utf8PathBuf,

    /// Base filename of the rotating stable-file archive (e.g. `stables.zip`).
    pub stable_archive_name: String,

    /// Prefix prepended to every output archive filename.
    ///
    /// The CLI defaults this to the process start time in epoch seconds,
    /// so repeated runs never clobber each other's output.
    pub output_prefix: String,

    /// Number of entry additions between forced commits of the stable archive.
    pub commit_every: u64,

    /// Archive size in bytes that triggers rotation to the next part.
    pub rotate_threshold_bytes: u64,

    /// Minimum size in bytes for a `modified` event to be treated as a
    /// growing large file.
    pub large_file_threshold_bytes: u64,

    /// Chunk granularity in bytes for growing files. A chunk is cut each time
    /// the file's total size crosses the next multiple of this value.
    pub chunk_bytes: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            input_dir: Utf8PathBuf::from("/tmp/input"),
            output_dir: Utf8PathBuf::from("/tmp/output"),
            stable_archive_name: "stables.zip".to_owned(),
            output_prefix: String::new(),
            commit_every: DEFAULT_COMMIT_EVERY,
            rotate_threshold_bytes: DEFAULT_CHUNK_BYTES,
            large_file_threshold_bytes: DEFAULT_CHUNK_BYTES,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
        }
    }
}

impl ArchiveConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] if any size or count is zero,
    /// or if the stable archive name is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stable_archive_name.is_empty() {
            return Err(ConfigError::invalid_option(
                "stable_archive_name",
                "must not be empty",
            ));
        }
        if self.commit_every == 0 {
            return Err(ConfigError::invalid_option(
                "commit_every",
                "must be at least 1",
            ));
        }
        if self.rotate_threshold_bytes == 0 {
            return Err(ConfigError::invalid_option(
                "rotate_threshold_bytes",
                "must be at least 1 byte",
            ));
        }
        if self.chunk_bytes == 0 {
            return Err(ConfigError::invalid_option(
                "chunk_bytes",
                "must be at least 1 byte",
            ));
        }
        Ok(())
    }
}

/// Configuration for the polling directory watcher.
///
/// Controls how often the watched directory is scanned and how many unchanged
/// polls a file must survive before it is considered stable.
///
/// # Examples
///
/// ```
/// use xw_core::WatchConfig;
///
/// let config = WatchConfig::default();
/// assert_eq!(config.poll_interval_ms, 1000);
/// assert_eq!(config.stability_polls, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Interval between directory scans in milliseconds.
    pub poll_interval_ms: u64,

    /// Number of consecutive unchanged polls before a file is reported stable.
    pub stability_polls: u32,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            stability_polls: 2,
        }
    }
}

impl WatchConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] if the interval or stability
    /// window is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::invalid_option(
                "poll_interval_ms",
                "must be at least 1",
            ));
        }
        if self.stability_polls == 0 {
            return Err(ConfigError::invalid_option(
                "stability_polls",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Root configuration for the extraction-watcher tool.
///
/// Combines all component configurations into a single structure that can be
/// loaded from a configuration file or constructed programmatically.
///
/// # Examples
///
/// ```
/// use xw_core::Config;
///
/// let config = Config::default();
/// let json = serde_json::to_string_pretty(&config).unwrap();
/// let parsed: Config = serde_json::from_str(&json).unwrap();
/// assert_eq!(config, parsed);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Archival engine configuration.
    pub archive: ArchiveConfig,

    /// Polling watcher configuration.
    pub watch: WatchConfig,
}

impl Config {
    /// Validates all component configurations.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.archive.validate()?;
        self.watch.validate()
    }
}
