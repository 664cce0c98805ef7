//! Offset-tracked chunk emission for one growing file.
//!
//! A [`LargeFileTracker`] follows a single file that is still being written
//! in the watched directory. Each time the watcher reports the file as
//! modified, the tracker checks whether the file's *total size* has crossed
//! the next whole multiple of the batch size; if so, everything between the
//! archived offset and the current size is read and committed to the file's
//! dedicated archive as one chunk entry. Growth below the next boundary is a
//! no-op, which paces chunk emission rather than cutting on every event.
//!
//! # State Machine
//!
//! ```text
//! Draining ──(flush)──► Sealed (terminal)
//! ```
//!
//! The transition happens only on an explicit [`flush`](LargeFileTracker::flush);
//! a file that simply stops changing stays in Draining until shutdown.
//!
//! # Invariant
//!
//! The emitted chunk byte ranges are contiguous and non-overlapping, and
//! after a flush their union covers exactly `[0, final_size)`.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, trace};

use crate::dedup::split_extension;
use crate::error::ArchiveError;
use crate::handle::ArchiveHandle;

/// A chunk that was cut and committed, reported for logging and testing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkCut {
    /// Entry name the chunk was written under.
    pub entry_name: String,

    /// Inclusive start offset of the chunk in the source file.
    pub start: u64,

    /// Exclusive end offset of the chunk in the source file.
    pub end: u64,

    /// The chunk's index within the file (0-based).
    pub chunk_index: u64,
}

/// Per-file state machine tracking how much of one growing file is archived.
pub struct LargeFileTracker {
    /// The growing source file. Identity key of this tracker.
    source_path: Utf8PathBuf,

    /// Source file name split for chunk entry naming.
    stem: String,
    ext: String,

    /// This file's dedicated archive.
    handle: ArchiveHandle,

    /// Bytes already committed to the archive. Monotonically non-decreasing.
    archived_offset: u64,

    /// Number of chunks emitted so far.
    chunk_index: u64,

    /// Set on flush; a sealed tracker accepts no further emissions.
    sealed: bool,
}

impl std::fmt::Debug for LargeFileTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LargeFileTracker")
            .field("source_path", &self.source_path)
            .field("archive", &self.handle.path())
            .field("archived_offset", &self.archived_offset)
            .field("chunk_index", &self.chunk_index)
            .field("sealed", &self.sealed)
            .finish()
    }
}

impl LargeFileTracker {
    /// Starts tracking `source_path`, creating its dedicated archive at
    /// `archive_path` (truncating any existing file there).
    ///
    /// The caller owns archive naming and must hand every tracker a path no
    /// other live tracker writes to; [`LargeFileArchiver`] deduplicates stems
    /// across its registry before calling this.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::MissingFileName`] if the source path has no
    /// final component, or [`ArchiveError::Create`] if the archive cannot be
    /// created.
    ///
    /// [`LargeFileArchiver`]: crate::large::LargeFileArchiver
    pub fn open(
        source_path: Utf8PathBuf,
        archive_path: Utf8PathBuf,
    ) -> Result<Self, ArchiveError> {
        let file_name = source_path
            .file_name()
            .ok_or_else(|| ArchiveError::MissingFileName {
                path: source_path.clone(),
            })?;
        let (stem, ext) = split_extension(file_name);

        info!(source = %source_path, archive = %archive_path, "tracking new large file");
        let handle = ArchiveHandle::create(archive_path, 1)?;

        Ok(Self {
            stem: stem.to_owned(),
            ext: ext.to_owned(),
            source_path,
            handle,
            archived_offset: 0,
            chunk_index: 0,
            sealed: false,
        })
    }

    /// Emits one chunk if the file has crossed the next batch-size boundary.
    ///
    /// A chunk is cut if and only if `size / batch_size_bytes > chunk_index`,
    /// where `size` is the file's current total size. The chunk covers
    /// `[archived_offset, size)`, is committed to the archive before this
    /// call returns, and advances both the offset and the chunk index.
    /// Returns `None` when no new whole multiple has accumulated.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Sealed`] after a flush,
    /// [`ArchiveError::SourceStat`] if the source vanished, and read/commit
    /// errors with path and byte-range context. Nothing is retried.
    pub fn emit_available_chunk(
        &mut self,
        batch_size_bytes: u64,
    ) -> Result<Option<ChunkCut>, ArchiveError> {
        if self.sealed {
            return Err(ArchiveError::Sealed {
                archive: self.handle.path().to_owned(),
            });
        }

        let size = fs::metadata(&self.source_path)
            .map_err(|source| ArchiveError::SourceStat {
                path: self.source_path.clone(),
                source,
            })?
            .len();

        // Pace on whole-batch boundaries of total file size
        if size / batch_size_bytes <= self.chunk_index {
            trace!(
                source = %self.source_path,
                size,
                chunk_index = self.chunk_index,
                "no new whole batch accumulated"
            );
            return Ok(None);
        }

        // The final flush re-runs the cut with batch size 1; if nothing grew
        // since the last cut there is no tail to emit and no empty entry is
        // written.
        if size <= self.archived_offset {
            return Ok(None);
        }

        let start = self.archived_offset;
        let len = size - start;
        let data = self.read_range(start, len)?;

        let entry_name = self.chunk_entry_name();
        self.handle.add_bytes(&entry_name, &data)?;
        self.handle.commit()?;

        debug!(
            source = %self.source_path,
            archive = %self.handle.path(),
            entry = %entry_name,
            start,
            end = size,
            "chunk emitted"
        );

        let cut = ChunkCut {
            entry_name,
            start,
            end: size,
            chunk_index: self.chunk_index,
        };
        self.archived_offset = size;
        self.chunk_index += 1;
        Ok(Some(cut))
    }

    /// Flushes any unarchived tail bytes and seals the archive.
    ///
    /// The tail is emitted with a batch size of 1, so any remaining bytes are
    /// flushed as a final chunk regardless of boundary alignment. Flushing an
    /// already-sealed tracker is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates emission errors; on error the archive is left unsealed so
    /// the host can observe the failure.
    pub fn flush(&mut self) -> Result<Option<ChunkCut>, ArchiveError> {
        if self.sealed {
            return Ok(None);
        }
        debug!(source = %self.source_path, "flushing leftover bytes");
        let cut = self.emit_available_chunk(1)?;
        self.handle.seal()?;
        self.sealed = true;
        Ok(cut)
    }

    /// Returns the path of the tracked source file.
    #[must_use]
    pub fn source_path(&self) -> &Utf8Path {
        &self.source_path
    }

    /// Returns the path of this file's dedicated archive.
    #[must_use]
    pub fn archive_path(&self) -> &Utf8Path {
        self.handle.path()
    }

    /// Returns how many bytes have been committed to the archive.
    #[must_use]
    pub fn archived_offset(&self) -> u64 {
        self.archived_offset
    }

    /// Returns the number of chunks emitted so far.
    #[must_use]
    pub fn chunk_index(&self) -> u64 {
        self.chunk_index
    }

    /// Returns `true` once the tracker has been flushed and sealed.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Reads `[start, start + len)` from the source file.
    fn read_range(&self, start: u64, len: u64) -> Result<Vec<u8>, ArchiveError> {
        let mut file = File::open(&self.source_path).map_err(|source| ArchiveError::SourceOpen {
            path: self.source_path.clone(),
            source,
        })?;
        file.seek(SeekFrom::Start(start))
            .map_err(|source| ArchiveError::SourceRead {
                path: self.source_path.clone(),
                offset: start,
                len,
                source,
            })?;

        let mut data = Vec::new();
        file.take(len)
            .read_to_end(&mut data)
            .map_err(|source| ArchiveError::SourceRead {
                path: self.source_path.clone(),
                offset: start,
                len,
                source,
            })?;
        Ok(data)
    }

    /// Entry name for the next chunk: the bare file name for chunk 0, then
    /// `{stem}_part2{ext}`, `{stem}_part3{ext}`, and so on.
    fn chunk_entry_name(&self) -> String {
        if self.chunk_index == 0 {
            format!("{}{}", self.stem, self.ext)
        } else {
            format!("{}_part{}{}", self.stem, self.chunk_index + 1, self.ext)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;
    use tempfile::TempDir;

    fn temp_dir() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 path");
        (dir, path)
    }

    fn append(path: &Utf8Path, bytes: &[u8]) {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .expect("open for append");
        file.write_all(bytes).expect("append");
    }

    fn entry_bytes(archive_path: &Utf8Path, entry: &str) -> Vec<u8> {
        let file = File::open(archive_path).expect("open archive");
        let mut archive = zip::ZipArchive::new(file).expect("parse archive");
        let mut data = Vec::new();
        archive
            .by_name(entry)
            .expect("entry present")
            .read_to_end(&mut data)
            .expect("read entry");
        data
    }

    fn archive_len(archive_path: &Utf8Path) -> usize {
        let file = File::open(archive_path).expect("open archive");
        zip::ZipArchive::new(file).expect("parse archive").len()
    }

    #[test]
    fn test_no_chunk_below_first_boundary() {
        let (_dir, root) = temp_dir();
        let source = root.join("grow.log");
        append(&source, &[b'a'; 500]);

        let mut tracker = LargeFileTracker::open(source.clone(), root.join("grow.zip")).expect("open");
        let cut = tracker.emit_available_chunk(1000).expect("emit");
        assert!(cut.is_none());
        assert_eq!(tracker.archived_offset(), 0);
        assert_eq!(tracker.chunk_index(), 0);
    }

    #[test]
    fn test_chunk_cut_covers_everything_up_to_current_size() {
        let (_dir, root) = temp_dir();
        let source = root.join("grow.log");
        // 0 -> 500: below the 1000-byte boundary, then 500 -> 1200: crosses it
        append(&source, &[b'a'; 500]);

        let mut tracker = LargeFileTracker::open(source.clone(), root.join("grow.zip")).expect("open");
        assert!(tracker.emit_available_chunk(1000).expect("emit").is_none());

        append(&source, &[b'b'; 700]);
        let cut = tracker
            .emit_available_chunk(1000)
            .expect("emit")
            .expect("chunk expected");
        assert_eq!(cut.start, 0);
        assert_eq!(cut.end, 1200);
        assert_eq!(cut.entry_name, "grow.log");
        assert_eq!(tracker.archived_offset(), 1200);
        assert_eq!(tracker.chunk_index(), 1);
    }

    #[test]
    fn test_emit_is_idempotent_without_growth() {
        let (_dir, root) = temp_dir();
        let source = root.join("grow.log");
        append(&source, &[b'a'; 1500]);

        let mut tracker = LargeFileTracker::open(source.clone(), root.join("grow.zip")).expect("open");
        assert!(tracker.emit_available_chunk(1000).expect("first").is_some());
        // No intervening growth: zero additional entries
        assert!(tracker.emit_available_chunk(1000).expect("second").is_none());
        assert_eq!(tracker.chunk_index(), 1);
    }

    #[test]
    fn test_flush_scenario_exactly_one_entry() {
        let (_dir, root) = temp_dir();
        let source = root.join("grow.log");
        append(&source, &[b'a'; 500]);

        let mut tracker = LargeFileTracker::open(source.clone(), root.join("grow.zip")).expect("open");
        assert!(tracker.emit_available_chunk(1000).expect("emit").is_none());

        append(&source, &[b'b'; 700]);
        assert!(tracker.emit_available_chunk(1000).expect("emit").is_some());

        // Flush re-checks with batch size 1; no new bytes means no new entry
        let tail = tracker.flush().expect("flush");
        assert!(tail.is_none());
        assert!(tracker.is_sealed());
        assert_eq!(archive_len(tracker.archive_path()), 1);
    }

    #[test]
    fn test_flush_emits_unaligned_tail() {
        let (_dir, root) = temp_dir();
        let source = root.join("events.ndjson");
        append(&source, &[b'a'; 1000]);

        let mut tracker =
            LargeFileTracker::open(source.clone(), root.join("events.zip")).expect("open");
        assert!(tracker.emit_available_chunk(1000).expect("emit").is_some());

        // 300 tail bytes below the next boundary
        append(&source, &[b'b'; 300]);
        assert!(tracker.emit_available_chunk(1000).expect("emit").is_none());

        let tail = tracker.flush().expect("flush").expect("tail chunk");
        assert_eq!(tail.start, 1000);
        assert_eq!(tail.end, 1300);
        assert_eq!(tail.entry_name, "events_part2.ndjson");

        // Union of all chunks covers [0, 1300) exactly
        let archive = tracker.archive_path();
        assert_eq!(entry_bytes(archive, "events.ndjson"), vec![b'a'; 1000]);
        assert_eq!(entry_bytes(archive, "events_part2.ndjson"), vec![b'b'; 300]);
    }

    #[test]
    fn test_chunk_ranges_are_contiguous() {
        let (_dir, root) = temp_dir();
        let source = root.join("grow.bin");

        let mut tracker = LargeFileTracker::open(source.clone(), root.join("grow.zip")).expect("open");
        let sizes = [150_u64, 400, 120, 500, 80];
        let mut cuts = Vec::new();

        for chunk in &sizes {
            let grown = usize::try_from(*chunk).expect("small test size");
            append(&source, &vec![b'x'; grown]);
            if let Some(cut) = tracker.emit_available_chunk(100).expect("emit") {
                cuts.push(cut);
            }
        }
        if let Some(cut) = tracker.flush().expect("flush") {
            cuts.push(cut);
        }

        let total: u64 = sizes.iter().sum();
        let mut expected_start = 0;
        for cut in &cuts {
            assert_eq!(cut.start, expected_start, "ranges must be contiguous");
            assert!(cut.end > cut.start);
            expected_start = cut.end;
        }
        assert_eq!(expected_start, total, "union must cover [0, final_size)");
    }

    #[test]
    fn test_cut_condition_boundary() {
        let (_dir, root) = temp_dir();
        let source = root.join("grow.log");
        // size / batch == chunk_index means no cut: 1000 / 1000 == 1 after one chunk
        append(&source, &[b'a'; 1000]);

        let mut tracker = LargeFileTracker::open(source.clone(), root.join("grow.zip")).expect("open");
        assert!(tracker.emit_available_chunk(1000).expect("emit").is_some());

        // Exactly at the boundary already consumed: 1000 / 1000 = 1 <= 1
        assert!(tracker.emit_available_chunk(1000).expect("emit").is_none());

        // One byte past the next boundary: 2001 / 1000 = 2 > 1
        append(&source, &[b'b'; 1001]);
        let cut = tracker
            .emit_available_chunk(1000)
            .expect("emit")
            .expect("chunk expected");
        assert_eq!(cut.start, 1000);
        assert_eq!(cut.end, 2001);
    }

    #[test]
    fn test_vanished_source_propagates_and_recurs() {
        let (_dir, root) = temp_dir();
        let source = root.join("vanish.log");
        append(&source, &[b'a'; 100]);

        let mut tracker =
            LargeFileTracker::open(source.clone(), root.join("vanish.zip")).expect("open");
        std::fs::remove_file(&source).expect("delete source");

        let err = tracker.emit_available_chunk(10).unwrap_err();
        assert!(err.is_vanished_source());

        // The tracker is not torn down; the error recurs on the next event
        let err = tracker.emit_available_chunk(10).unwrap_err();
        assert!(err.is_vanished_source());
        assert!(!tracker.is_sealed());
    }

    #[test]
    fn test_emit_after_flush_is_rejected() {
        let (_dir, root) = temp_dir();
        let source = root.join("done.log");
        append(&source, &[b'a'; 10]);

        let mut tracker =
            LargeFileTracker::open(source.clone(), root.join("done.zip")).expect("open");
        tracker.flush().expect("flush");

        let err = tracker.emit_available_chunk(1).unwrap_err();
        assert!(matches!(err, ArchiveError::Sealed { .. }));

        // A second flush is a harmless no-op
        assert!(tracker.flush().expect("reflush").is_none());
    }

    #[test]
    fn test_archive_path_is_caller_provided() {
        let (_dir, root) = temp_dir();
        let source = root.join("dossiers.csv");
        append(&source, b"header\n");

        let archive = root.join("1700000000_dossiers.zip");
        let tracker = LargeFileTracker::open(source, archive.clone()).expect("open");
        assert_eq!(tracker.archive_path(), archive);
    }
}
