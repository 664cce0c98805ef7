//! File activity events exchanged between the watcher and the archival engine.
//!
//! The watcher classifies raw filesystem activity into discrete [`Event`]s on a
//! fixed polling interval. The archival engine consumes these events one at a
//! time; it never inspects the filesystem to classify activity itself.
//!
//! # Event Flow
//!
//! ```text
//! Filesystem change
//!        │
//!        ▼
//! Polling scan (stability window)
//!        │
//!        ▼
//!   Event created
//!        │
//!        ▼
//!   Sent via channel to the engine
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// The classification of a file activity event.
///
/// Only [`Stable`](EventKind::Stable) and [`Modified`](EventKind::Modified)
/// are meaningful to the archival engine; the others exist so the watcher can
/// report a complete picture of directory activity and are ignored downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A file appeared in the watched directory.
    Created,
    /// A file's size or modification time changed since the last poll.
    Modified,
    /// A file disappeared from the watched directory.
    Removed,
    /// A file has not been touched for the configured stability window and is
    /// treated as complete. Emitted at most once per file generation.
    Stable,
}

/// A single file activity event with a UTF-8 path guarantee.
///
/// Events are immutable and consumed once. The size is the file's size in
/// bytes as observed by the poll that produced the event (zero for
/// [`EventKind::Removed`]).
///
/// # Examples
///
/// ```
/// use xw_core::{Event, EventKind};
/// use camino::Utf8PathBuf;
///
/// let event = Event::new(EventKind::Stable, Utf8PathBuf::from("/tmp/input/report.csv"), 1024);
/// assert!(event.is_stable());
/// assert_eq!(event.file_name(), Some("report.csv"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// What happened to the file.
    pub kind: EventKind,

    /// Absolute path of the affected file.
    pub path: Utf8PathBuf,

    /// File size in bytes at the time of the poll.
    pub size: u64,
}

impl Event {
    /// Creates a new event.
    #[inline]
    #[must_use]
    pub const fn new(kind: EventKind, path: Utf8PathBuf, size: u64) -> Self {
        Self { kind, path, size }
    }

    /// Returns `true` if this event marks a file as complete.
    #[inline]
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.kind == EventKind::Stable
    }

    /// Returns `true` if this event marks a file as still changing.
    #[inline]
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.kind == EventKind::Modified
    }

    /// Returns the file name without the directory path.
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name()
    }

    /// Returns the path as a borrowed [`Utf8Path`].
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {} ({} bytes)", self.kind, self.path, self.size)
    }
}
