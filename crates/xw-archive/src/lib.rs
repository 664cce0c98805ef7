//! Incremental zip archival engine for stable and growing files.
//!
//! This crate turns the event stream produced by a directory watcher into
//! compressed archive output under two policies:
//!
//! - **Stable files** (reported complete by the watcher) are added whole to a
//!   rotating, size-bounded archive family with deterministic duplicate-name
//!   resolution.
//! - **Large, still-growing files** are tracked per path; each time a file's
//!   total size crosses the next batch-size boundary, the newly available
//!   byte range is committed to that file's dedicated archive as one chunk.
//!
//! # Architecture
//!
//! ```text
//! watcher ──► Event ──► ExtractionEngine
//!                            │
//!              ┌─────────────┴──────────────┐
//!              ▼                            ▼
//!     StableFileArchiver            LargeFileArchiver
//!     ├─ NameDeduplicator           └─ LargeFileTracker (per path)
//!     └─ ArchiveRotator                  └─ ArchiveHandle
//!          └─ ArchiveHandle
//! ```
//!
//! # Durability Model
//!
//! Archives are committed incrementally: the central directory is finished,
//! the file is synced, and the writer reopens in append mode. After every
//! commit the archive on disk is readable by standard zip tools. The host
//! must call [`ExtractionEngine::flush`] exactly once on graceful shutdown;
//! an archive that was never sealed may be structurally incomplete.
//!
//! # What this crate does not do
//!
//! - No filesystem polling or event classification (the watcher's job).
//! - No exactly-once delivery across process restarts: offsets live in
//!   memory only, with no persisted recovery log.
//! - No post-write integrity verification of finished archives.
//! - No support for concurrent writers to the same watched directory.
//!
//! # Usage
//!
//! ```no_run
//! use xw_archive::ExtractionEngine;
//! use xw_core::{ArchiveConfig, Event, EventKind};
//! use camino::Utf8PathBuf;
//!
//! # fn main() -> Result<(), xw_archive::ArchiveError> {
//! let config = ArchiveConfig::default();
//! let mut engine = ExtractionEngine::new(&config)?;
//!
//! // Events arrive from the watcher, one at a time
//! let event = Event::new(
//!     EventKind::Stable,
//!     Utf8PathBuf::from("/tmp/input/report.csv"),
//!     1024,
//! );
//! engine.on_event(&event)?;
//!
//! // Seal every open archive on shutdown
//! engine.flush()?;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod dedup;
pub mod engine;
pub mod error;
pub mod handle;
pub mod large;
pub mod rotator;
pub mod stable;
pub mod tracker;

pub use dedup::NameDeduplicator;
pub use engine::ExtractionEngine;
pub use error::ArchiveError;
pub use handle::ArchiveHandle;
pub use large::LargeFileArchiver;
pub use rotator::ArchiveRotator;
pub use stable::StableFileArchiver;
pub use tracker::{ChunkCut, LargeFileTracker};
