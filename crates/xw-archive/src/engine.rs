//! Event routing between the watcher and the two archival policies.
//!
//! [`ExtractionEngine`] is the coordinator: it receives classified events
//! from the external watcher and routes them to the [`StableFileArchiver`]
//! or the [`LargeFileArchiver`]. Events are delivered one at a time on a
//! single logical thread; the engine's entry points take `&mut self`, so the
//! type system already forbids concurrent dispatch.
//!
//! ```text
//! watcher ──► Event ──► ExtractionEngine ──┬──► StableFileArchiver ──► rotating archive
//!                                          └──► LargeFileArchiver  ──► per-file archives
//! ```
//!
//! On graceful shutdown the host must call [`flush`](ExtractionEngine::flush)
//! exactly once; omitting it leaves the last-opened archives structurally
//! incomplete and unreadable by standard zip readers.

use tracing::{debug, trace};

use xw_core::{ArchiveConfig, Event, EventKind};

use crate::error::ArchiveError;
use crate::large::LargeFileArchiver;
use crate::stable::StableFileArchiver;

/// Coordinator that routes watcher events to the archival policies.
#[derive(Debug)]
pub struct ExtractionEngine {
    /// Whole-file archival for stable files.
    stable: StableFileArchiver,

    /// Incremental chunk archival for growing files.
    large: LargeFileArchiver,

    /// Minimum size for a modified event to be treated as a large file.
    large_file_threshold_bytes: u64,
}

impl ExtractionEngine {
    /// Creates the engine, opening part 1 of the stable archive family.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Config`] if the configuration fails
    /// validation, or [`ArchiveError::Create`] if the stable archive cannot
    /// be created in the configured output directory.
    pub fn new(config: &ArchiveConfig) -> Result<Self, ArchiveError> {
        config.validate()?;

        Ok(Self {
            stable: StableFileArchiver::new(config)?,
            large: LargeFileArchiver::new(config),
            large_file_threshold_bytes: config.large_file_threshold_bytes,
        })
    }

    /// Routes one event to the appropriate archiver.
    ///
    /// `stable` events are archived whole; `modified` events above the
    /// large-file threshold feed the per-file chunk trackers. Everything
    /// else is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Propagates I/O and zip errors from the archivers unchanged; nothing
    /// is retried or converted into a skip.
    pub fn on_event(&mut self, event: &Event) -> Result<(), ArchiveError> {
        match event.kind {
            EventKind::Stable => {
                debug!(%event, "stable file event");
                self.stable.add(&event.path)
            }
            EventKind::Modified if event.size > self.large_file_threshold_bytes => {
                debug!(%event, "large modified file event");
                self.large.handle_modified(&event.path).map(|_| ())
            }
            EventKind::Created | EventKind::Modified | EventKind::Removed => {
                trace!(%event, "event ignored");
                Ok(())
            }
        }
    }

    /// Seals every open archive.
    ///
    /// The stable archive is closed first (it has no further dependents),
    /// then every large-file archive is flushed and sealed. Both halves are
    /// attempted even if the first fails; the first error is returned.
    ///
    /// Must be called exactly once on graceful shutdown.
    ///
    /// # Errors
    ///
    /// Returns the first seal or flush error encountered.
    pub fn flush(&mut self) -> Result<(), ArchiveError> {
        debug!("flushing all open archives");
        let stable_result = self.stable.close();
        let large_result = self.large.flush_all();

        stable_result?;
        large_result
    }

    /// Returns the stable-file archiver, for inspection.
    #[must_use]
    pub fn stable(&self) -> &StableFileArchiver {
        &self.stable
    }

    /// Returns the large-file archiver, for inspection.
    #[must_use]
    pub fn large(&self) -> &LargeFileArchiver {
        &self.large
    }
}
