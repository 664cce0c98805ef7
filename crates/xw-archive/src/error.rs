//! Error types for the xw-archive crate.
//!
//! This module provides the [`ArchiveError`] type for failures during archive
//! writing, commit, and chunk emission. Every variant that involves a file
//! carries the path (and, for chunk reads, the byte range) so callers can log
//! enough context to diagnose partial writes and vanished sources.

use camino::Utf8PathBuf;
use zip::result::ZipError;

/// Errors that can occur during archival operations.
///
/// # Error Recovery Strategy
///
/// None of these errors are retried internally. The watcher does not
/// re-deliver a `stable` event, so retry logic belongs to an outer
/// supervisory layer, not this engine. A vanished source
/// ([`ArchiveError::SourceStat`] with a not-found cause) recurs on every
/// subsequent event for that path until the host intervenes.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Failed to create a new archive file on disk.
    #[error("failed to create archive {path}: {source}")]
    Create {
        /// Path of the archive that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to commit an archive to durable storage.
    ///
    /// Covers finalizing the central directory, syncing to disk, and
    /// reopening the archive for further appends.
    #[error("failed to commit archive {archive}: {source}")]
    Commit {
        /// Path of the archive being committed.
        archive: Utf8PathBuf,
        /// Underlying zip or I/O error.
        source: ZipError,
    },

    /// Failed to stat a source file, typically because it vanished mid-watch.
    #[error("failed to stat source file {path}: {source}")]
    SourceStat {
        /// Path of the source file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to open a source file for reading.
    #[error("failed to open source file {path}: {source}")]
    SourceOpen {
        /// Path of the source file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to read a byte range from a source file.
    #[error("failed to read {len} bytes at offset {offset} from {path}: {source}")]
    SourceRead {
        /// Path of the source file.
        path: Utf8PathBuf,
        /// Byte offset the read started at.
        offset: u64,
        /// Number of bytes the read attempted.
        len: u64,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An entry with this name was already written to the archive.
    ///
    /// Entry names are deduplicated before they reach the archive, so this
    /// indicates a bookkeeping bug rather than a user-facing collision.
    #[error("duplicate entry '{entry}' in archive {archive}")]
    DuplicateEntry {
        /// The colliding entry name.
        entry: String,
        /// Path of the archive.
        archive: Utf8PathBuf,
    },

    /// The path has no final file name component to derive an entry name from.
    #[error("path has no file name: {path}")]
    MissingFileName {
        /// The offending path.
        path: Utf8PathBuf,
    },

    /// The archive was already sealed and accepts no further writes.
    #[error("archive {archive} is sealed")]
    Sealed {
        /// Path of the sealed archive.
        archive: Utf8PathBuf,
    },

    /// The engine was constructed from an invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] xw_core::ConfigError),

    /// A zip structural error occurred while writing an entry.
    #[error("zip error: {0}")]
    Zip(#[from] ZipError),

    /// An uncontextualized I/O error occurred while writing entry data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Returns `true` if this error was caused by a source file that no
    /// longer exists (deleted or renamed between events).
    #[must_use]
    pub fn is_vanished_source(&self) -> bool {
        match self {
            Self::SourceStat { source, .. } | Self::SourceOpen { source, .. } => {
                source.kind() == std::io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}
