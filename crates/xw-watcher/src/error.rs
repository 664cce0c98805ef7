//! Error types for the xw-watcher crate.
//!
//! This module provides the [`WatchError`] type for errors that can occur
//! while polling a watched directory.

use camino::Utf8PathBuf;

/// Errors that can occur during directory watching operations.
///
/// These errors cover path validation, channel communication issues, and
/// I/O errors raised while scanning the watched directory.
///
/// # Error Recovery Strategy
///
/// - **Path not found** ([`WatchError::PathNotFound`]): Fatal - path must exist
/// - **Not a directory** ([`WatchError::NotADirectory`]): Fatal - only directories are watchable
/// - **Channel closed** ([`WatchError::ChannelClosed`]): Fatal - communication broken
/// - **Non-UTF-8 path** ([`WatchError::NonUtf8Path`]): Recoverable - skip and continue
/// - **I/O errors** ([`WatchError::Io`]): Fatal - propagate immediately
///
/// # Examples
///
/// ```
/// use xw_watcher::WatchError;
/// use camino::Utf8PathBuf;
///
/// fn handle_error(err: WatchError) {
///     match err {
///         WatchError::PathNotFound(p) => eprintln!("Path not found: {p}"),
///         WatchError::NotADirectory(p) => eprintln!("Not a directory: {p}"),
///         WatchError::ChannelClosed => eprintln!("Channel closed"),
///         WatchError::NonUtf8Path(p) => eprintln!("Invalid path: {}", p.display()),
///         WatchError::Io(e) => eprintln!("I/O error: {e}"),
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The specified path does not exist.
    ///
    /// The watcher requires a valid, existing path to watch.
    #[error("path does not exist: {0}")]
    PathNotFound(Utf8PathBuf),

    /// The specified path exists but is not a directory.
    ///
    /// The scanner enumerates directory entries, so watching a file makes
    /// no sense.
    #[error("path is not a directory: {0}")]
    NotADirectory(Utf8PathBuf),

    /// The event channel was closed unexpectedly.
    ///
    /// This indicates a communication failure between the polling thread
    /// and the async event consumer.
    #[error("event channel closed unexpectedly")]
    ChannelClosed,

    /// A path is not valid UTF-8.
    ///
    /// This crate uses UTF-8 paths throughout. If a non-UTF-8 path is
    /// encountered during a scan, it is logged and skipped.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// An I/O error occurred.
    ///
    /// General I/O errors during path validation or directory enumeration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatchError {
    /// Creates a new [`WatchError::PathNotFound`] error.
    #[inline]
    pub fn path_not_found(path: impl Into<Utf8PathBuf>) -> Self {
        Self::PathNotFound(path.into())
    }

    /// Creates a new [`WatchError::NotADirectory`] error.
    #[inline]
    pub fn not_a_directory(path: impl Into<Utf8PathBuf>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Creates a new [`WatchError::NonUtf8Path`] error.
    #[inline]
    pub fn non_utf8_path(path: impl Into<std::path::PathBuf>) -> Self {
        Self::NonUtf8Path(path.into())
    }

    /// Returns `true` if this error is recoverable (watching can continue).
    ///
    /// Recoverable errors are entry-specific issues that don't prevent
    /// scanning other files. Currently, only non-UTF-8 path errors are
    /// recoverable as they can be skipped.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NonUtf8Path(_))
    }

    /// Returns `true` if this error is fatal (watching should stop).
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::PathNotFound(path) | Self::NotADirectory(path) => Some(path),
            Self::ChannelClosed | Self::NonUtf8Path(_) | Self::Io(_) => None,
        }
    }
}
