//! Registry of growing files and their per-file trackers.
//!
//! [`LargeFileArchiver`] consumes `modified` events for files above the
//! large-file threshold. It owns an explicit registry of
//! [`LargeFileTracker`]s keyed by source path, with insertion-on-first-use
//! semantics: the first event for a path opens that file's dedicated archive,
//! and every event after that reuses the existing tracker. There is no
//! process-wide state; the registry lives and dies with this archiver.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, error};

use xw_core::{ArchiveConfig, FxHashMap};

use crate::dedup::{split_extension, NameDeduplicator};
use crate::error::ArchiveError;
use crate::tracker::{ChunkCut, LargeFileTracker};

/// Consumes modified events for large files and routes them to per-file
/// trackers.
#[derive(Debug)]
pub struct LargeFileArchiver {
    /// Directory archives are written into.
    output_dir: Utf8PathBuf,

    /// Filename prefix shared by every per-file archive.
    prefix: String,

    /// Chunk granularity in bytes, constant for the life of every tracker.
    chunk_bytes: u64,

    /// Tracker registry keyed by source path.
    trackers: FxHashMap<Utf8PathBuf, LargeFileTracker>,

    /// Archive-name collision resolution across the registry.
    ///
    /// Different source files can share a stem (`data.csv` and `data.log`);
    /// without renaming, the second tracker would truncate the first one's
    /// live archive.
    archive_names: NameDeduplicator,
}

impl LargeFileArchiver {
    /// Creates an empty archiver. No archives are opened until the first
    /// modified event arrives.
    #[must_use]
    pub fn new(config: &ArchiveConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            prefix: config.output_prefix.clone(),
            chunk_bytes: config.chunk_bytes,
            trackers: FxHashMap::default(),
            archive_names: NameDeduplicator::new(),
        }
    }

    /// Handles one modified event for a growing file.
    ///
    /// Looks up or lazily creates the tracker for `path` (first creation
    /// opens that file's dedicated archive, named `{prefix}{stem}.zip` and
    /// deduplicated across the registry so colliding stems never share an
    /// archive), then asks it to emit any newly available whole chunk.
    /// Returns the cut if one was emitted.
    ///
    /// # Errors
    ///
    /// Propagates archive-creation, vanished-source, and read/write errors
    /// unchanged. A failing tracker stays in the registry, so a vanished
    /// source produces the same error on every subsequent event for that
    /// path until the host intervenes.
    pub fn handle_modified(&mut self, path: &Utf8Path) -> Result<Option<ChunkCut>, ArchiveError> {
        use std::collections::hash_map::Entry;

        let tracker = match self.trackers.entry(path.to_owned()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let file_name = path.file_name().ok_or_else(|| ArchiveError::MissingFileName {
                    path: path.to_owned(),
                })?;
                let (stem, _ext) = split_extension(file_name);
                let archive_name = self.archive_names.resolve(&format!("{stem}.zip"));
                let archive_path = self.output_dir.join(format!("{}{archive_name}", self.prefix));

                debug!(source = %path, archive = %archive_path, "new large file tracker created");
                let tracker = LargeFileTracker::open(path.to_owned(), archive_path)?;
                entry.insert(tracker)
            }
        };
        tracker.emit_available_chunk(self.chunk_bytes)
    }

    /// Flushes the leftover tail of every tracked file and seals its archive.
    ///
    /// Used at shutdown. Every tracker is flushed even if an earlier one
    /// fails; the first error is returned after all flushes were attempted,
    /// and each failure is logged with its path.
    ///
    /// # Errors
    ///
    /// Returns the first flush error encountered, if any.
    pub fn flush_all(&mut self) -> Result<(), ArchiveError> {
        if !self.trackers.is_empty() {
            debug!(
                tracked = self.trackers.len(),
                "flushing leftover bytes for all large files"
            );
        }

        let mut first_error = None;
        for tracker in self.trackers.values_mut() {
            if let Err(err) = tracker.flush() {
                error!(
                    source = %tracker.source_path(),
                    archive = %tracker.archive_path(),
                    offset = tracker.archived_offset(),
                    error = %err,
                    "failed to flush large file"
                );
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Returns the number of files currently tracked.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.trackers.len()
    }

    /// Returns `true` if a tracker exists for `path`.
    #[must_use]
    pub fn is_tracking(&self, path: &Utf8Path) -> bool {
        self.trackers.contains_key(path)
    }

    /// Returns the tracker for `path`, if one exists.
    #[must_use]
    pub fn tracker(&self, path: &Utf8Path) -> Option<&LargeFileTracker> {
        self.trackers.get(path)
    }
}
