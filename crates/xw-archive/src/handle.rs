//! An open, mutable zip archive on disk.
//!
//! [`ArchiveHandle`] wraps a [`ZipWriter`] with the commit semantics the
//! engine relies on: after every [`commit`](ArchiveHandle::commit) the archive
//! on disk has a finished central directory and is readable by standard zip
//! tools, yet the handle can keep appending entries. This is done by
//! finishing the writer, syncing the file, and reopening it in append mode.
//!
//! # Lifecycle
//!
//! ```text
//! create ──► add_file / add_bytes ──► commit ──► ... ──► seal
//!                  ▲                     │
//!                  └─────────────────────┘
//! ```
//!
//! A sealed handle accepts no further writes; any attempt returns
//! [`ArchiveError::Sealed`].

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, trace};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use xw_core::FxHashSet;

use crate::error::ArchiveError;

/// Entry options used for every write.
///
/// `large_file` is enabled because growing-file chunks can exceed the Zip32
/// 4 GiB entry limit.
fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(true)
}

/// An open, size-tracked zip archive owned by exactly one component.
///
/// The handle records every entry name written to it; writing the same name
/// twice is an [`ArchiveError::DuplicateEntry`]. `current_size` reflects the
/// archive's on-disk size after the last persisted commit, not the size of
/// uncommitted writes.
pub struct ArchiveHandle {
    /// Path of the archive on disk.
    path: Utf8PathBuf,

    /// Sequential part number within the archive family, starting at 1.
    part_number: u32,

    /// The underlying writer. `None` once the handle is sealed.
    writer: Option<ZipWriter<File>>,

    /// Names already written to this archive. No duplicates.
    entry_names: FxHashSet<String>,

    /// On-disk size in bytes after the last commit.
    current_size: u64,
}

impl std::fmt::Debug for ArchiveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveHandle")
            .field("path", &self.path)
            .field("part_number", &self.part_number)
            .field("entries", &self.entry_names.len())
            .field("current_size", &self.current_size)
            .field("sealed", &self.writer.is_none())
            .finish()
    }
}

impl ArchiveHandle {
    /// Creates a new archive file at `path`, truncating any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Create`] if the file cannot be created.
    pub fn create(path: Utf8PathBuf, part_number: u32) -> Result<Self, ArchiveError> {
        let file = File::create(&path).map_err(|source| ArchiveError::Create {
            path: path.clone(),
            source,
        })?;
        debug!(archive = %path, part = part_number, "created new archive");
        Ok(Self {
            path,
            part_number,
            writer: Some(ZipWriter::new(file)),
            entry_names: FxHashSet::default(),
            current_size: 0,
        })
    }

    /// Appends the contents of `source_path` as a new entry.
    ///
    /// Returns the number of uncompressed bytes copied.
    ///
    /// # Errors
    ///
    /// Fails on duplicate entry names, a sealed handle, or any I/O error on
    /// either the source or the archive.
    pub fn add_file(
        &mut self,
        entry_name: &str,
        source_path: &Utf8Path,
    ) -> Result<u64, ArchiveError> {
        self.ensure_open()?;
        self.ensure_entry_available(entry_name)?;

        let mut source = File::open(source_path).map_err(|source| ArchiveError::SourceOpen {
            path: source_path.to_owned(),
            source,
        })?;

        let writer = self.writer_mut()?;
        writer.start_file(entry_name, entry_options())?;
        let written = io::copy(&mut source, writer)?;

        // Registered only once the write succeeded, so a failed add leaves
        // the name free for a later attempt
        self.entry_names.insert(entry_name.to_owned());
        trace!(archive = %self.path, entry = entry_name, bytes = written, "entry written");
        Ok(written)
    }

    /// Appends a byte buffer as a new entry.
    ///
    /// # Errors
    ///
    /// Fails on duplicate entry names, a sealed handle, or any write error.
    pub fn add_bytes(&mut self, entry_name: &str, data: &[u8]) -> Result<(), ArchiveError> {
        self.ensure_open()?;
        self.ensure_entry_available(entry_name)?;

        let writer = self.writer_mut()?;
        writer.start_file(entry_name, entry_options())?;
        writer.write_all(data)?;
        self.entry_names.insert(entry_name.to_owned());
        trace!(archive = %self.path, entry = entry_name, bytes = data.len(), "entry written");
        Ok(())
    }

    /// Flushes pending writes to durable storage.
    ///
    /// Finishes the central directory, syncs the file to disk, measures the
    /// resulting archive size, and reopens the archive for further appends.
    /// After this call the archive on disk is readable by standard zip tools.
    ///
    /// Returns the committed archive size in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Commit`] if finalizing, syncing, or reopening
    /// fails, and [`ArchiveError::Sealed`] if the handle was already sealed.
    pub fn commit(&mut self) -> Result<u64, ArchiveError> {
        let writer = self.writer.take().ok_or_else(|| ArchiveError::Sealed {
            archive: self.path.clone(),
        })?;

        let file = writer.finish().map_err(|source| ArchiveError::Commit {
            archive: self.path.clone(),
            source,
        })?;
        file.sync_all().map_err(|source| ArchiveError::Commit {
            archive: self.path.clone(),
            source: ZipError::Io(source),
        })?;
        drop(file);

        let size = fs::metadata(&self.path)
            .map_err(|source| ArchiveError::Commit {
                archive: self.path.clone(),
                source: ZipError::Io(source),
            })?
            .len();

        let reopened = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|source| ArchiveError::Commit {
                archive: self.path.clone(),
                source: ZipError::Io(source),
            })?;
        self.writer = Some(ZipWriter::new_append(reopened).map_err(|source| {
            ArchiveError::Commit {
                archive: self.path.clone(),
                source,
            }
        })?);

        self.current_size = size;
        debug!(archive = %self.path, size, "archive committed");
        Ok(size)
    }

    /// Commits and finalizes the archive; no further writes are accepted.
    ///
    /// Sealing an already-sealed handle is a no-op. Returns the final
    /// archive size in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Commit`] if finalizing or syncing fails.
    pub fn seal(&mut self) -> Result<u64, ArchiveError> {
        if let Some(writer) = self.writer.take() {
            let file = writer.finish().map_err(|source| ArchiveError::Commit {
                archive: self.path.clone(),
                source,
            })?;
            file.sync_all().map_err(|source| ArchiveError::Commit {
                archive: self.path.clone(),
                source: ZipError::Io(source),
            })?;
            self.current_size = fs::metadata(&self.path)
                .map_err(|source| ArchiveError::Commit {
                    archive: self.path.clone(),
                    source: ZipError::Io(source),
                })?
                .len();
            debug!(archive = %self.path, size = self.current_size, "archive sealed");
        }
        Ok(self.current_size)
    }

    /// Returns the archive's path on disk.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the part number within the archive family (1-based).
    #[must_use]
    pub fn part_number(&self) -> u32 {
        self.part_number
    }

    /// Returns the archive size in bytes after the last commit.
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Returns the number of entries written so far.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entry_names.len()
    }

    /// Returns `true` if an entry with this name was already written.
    #[must_use]
    pub fn contains_entry(&self, entry_name: &str) -> bool {
        self.entry_names.contains(entry_name)
    }

    /// Returns `true` if the handle has been sealed.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.writer.is_none()
    }

    fn ensure_open(&self) -> Result<(), ArchiveError> {
        if self.writer.is_none() {
            return Err(ArchiveError::Sealed {
                archive: self.path.clone(),
            });
        }
        Ok(())
    }

    fn writer_mut(&mut self) -> Result<&mut ZipWriter<File>, ArchiveError> {
        self.writer.as_mut().ok_or_else(|| ArchiveError::Sealed {
            archive: self.path.clone(),
        })
    }

    fn ensure_entry_available(&self, entry_name: &str) -> Result<(), ArchiveError> {
        if self.entry_names.contains(entry_name) {
            return Err(ArchiveError::DuplicateEntry {
                entry: entry_name.to_owned(),
                archive: self.path.clone(),
            });
        }
        Ok(())
    }
}
