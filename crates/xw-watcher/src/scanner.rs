//! Stat-polling directory scanner with stability classification.
//!
//! [`DirectoryScanner`] is the synchronous heart of the watcher. Each call
//! to [`poll`](DirectoryScanner::poll) enumerates the watched directory,
//! compares every regular file against the snapshot from the previous poll,
//! and produces the classified events the archival engine consumes:
//!
//! - `created` - the file was not present in the previous snapshot
//! - `modified` - size or mtime changed since the previous poll
//! - `stable` - unchanged for the configured number of consecutive polls
//! - `removed` - present in the previous snapshot, gone now
//!
//! Stability is edge-triggered: once a file has been reported stable it
//! stays silent until it changes again, at which point the unchanged-poll
//! counter resets and a new `stable` event becomes possible. A file that
//! alternates between growth and quiet therefore produces an alternating
//! stream of `modified` and `stable` events, which is exactly what a
//! slowly-appended export looks like.
//!
//! The scanner is deliberately shallow: subdirectories are skipped, not
//! recursed into. Drop directories are flat by convention and recursing
//! would force the naming scheme to encode paths.

use std::fs;
use std::io;
use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{trace, warn};

use xw_core::{Event, EventKind, FxHashMap, FxHashSet};

use crate::error::WatchError;
use crate::filter::FileFilter;

/// Per-file snapshot carried between polls.
#[derive(Debug, Clone, Copy)]
struct FileRecord {
    /// Size observed on the most recent poll.
    size: u64,

    /// Modification time observed on the most recent poll, if the
    /// platform reports one.
    modified: Option<SystemTime>,

    /// Consecutive polls with no observed change.
    unchanged_polls: u32,

    /// Whether a stable event was already emitted for the current
    /// quiet period.
    stable_reported: bool,
}

/// Polls a directory and classifies file changes into [`Event`]s.
///
/// The scanner owns all watcher state: a map from path to [`FileRecord`].
/// It performs no waiting itself; the caller decides the poll cadence.
///
/// # Examples
///
/// ```no_run
/// use xw_watcher::{AcceptAllFilter, DirectoryScanner};
/// use camino::Utf8PathBuf;
///
/// # fn main() -> Result<(), xw_watcher::WatchError> {
/// let mut scanner = DirectoryScanner::new(
///     Utf8PathBuf::from("/tmp/input"),
///     2,
///     AcceptAllFilter,
/// );
///
/// let events = scanner.poll()?;
/// for event in events {
///     println!("{event}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DirectoryScanner<F> {
    /// Directory being scanned.
    root: Utf8PathBuf,

    /// Consecutive unchanged polls required before a file is stable.
    stability_polls: u32,

    /// Predicate deciding which files are tracked at all.
    filter: F,

    /// Snapshot from the previous poll, keyed by path.
    records: FxHashMap<Utf8PathBuf, FileRecord>,
}

impl<F: FileFilter> DirectoryScanner<F> {
    /// Creates a scanner for `root`.
    ///
    /// No I/O happens here; the first [`poll`](Self::poll) takes the
    /// initial snapshot, reporting every existing file as `created`.
    #[must_use]
    pub fn new(root: Utf8PathBuf, stability_polls: u32, filter: F) -> Self {
        Self {
            root,
            stability_polls,
            filter,
            records: FxHashMap::default(),
        }
    }

    /// Scans the directory once and returns the events since the last poll.
    ///
    /// Files that vanish between the directory read and the stat call are
    /// skipped this round and surface as `removed` on the next poll.
    /// Non-UTF-8 file names are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Io`] if the directory itself cannot be read.
    /// Per-entry stat failures do not abort the scan.
    pub fn poll(&mut self) -> Result<Vec<Event>, WatchError> {
        let mut events = Vec::new();
        let mut seen: FxHashSet<Utf8PathBuf> = FxHashSet::default();

        for entry in fs::read_dir(&self.root)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    warn!(error = %error, "skipping unreadable directory entry");
                    continue;
                }
            };

            let path = match Utf8PathBuf::try_from(entry.path()) {
                Ok(path) => path,
                Err(error) => {
                    warn!(
                        path = %error.as_path().display(),
                        "skipping non-UTF-8 path"
                    );
                    continue;
                }
            };

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(error) if error.kind() == io::ErrorKind::NotFound => {
                    // Vanished between read_dir and stat
                    trace!(path = %path, "file vanished mid-scan");
                    continue;
                }
                Err(error) => {
                    warn!(path = %path, error = %error, "failed to stat file");
                    continue;
                }
            };

            if !metadata.is_file() {
                continue;
            }

            if !self.filter.should_process(&path) {
                trace!(path = %path, "filtered out");
                continue;
            }

            let size = metadata.len();
            let modified = metadata.modified().ok();
            seen.insert(path.clone());

            if let Some(record) = self.records.get_mut(&path) {
                if record.size != size || record.modified != modified {
                    record.size = size;
                    record.modified = modified;
                    record.unchanged_polls = 0;
                    record.stable_reported = false;
                    events.push(Event::new(EventKind::Modified, path, size));
                } else if !record.stable_reported {
                    record.unchanged_polls += 1;
                    if record.unchanged_polls >= self.stability_polls {
                        record.stable_reported = true;
                        events.push(Event::new(EventKind::Stable, path, size));
                    }
                }
            } else {
                self.records.insert(
                    path.clone(),
                    FileRecord {
                        size,
                        modified,
                        unchanged_polls: 0,
                        stable_reported: false,
                    },
                );
                events.push(Event::new(EventKind::Created, path, size));
            }
        }

        // Anything tracked but no longer present is removed
        let gone: Vec<Utf8PathBuf> = self
            .records
            .keys()
            .filter(|path| !seen.contains(*path))
            .cloned()
            .collect();
        for path in gone {
            self.records.remove(&path);
            events.push(Event::new(EventKind::Removed, path, 0));
        }

        Ok(events)
    }

    /// Returns the directory being scanned.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns the number of files currently tracked.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{AcceptAllFilter, ExtensionFilter};
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

    fn kinds_for<'a>(events: &'a [Event], path: &Utf8Path) -> Vec<&'a EventKind> {
        events
            .iter()
            .filter(|e| e.path == path)
            .map(|e| &e.kind)
            .collect()
    }

    #[test]
    fn test_new_file_reported_created() {
        let (_dir, root) = temp_dir();
        let file = root.join("orders.csv");
        append(&file, b"id,total\n");

        let mut scanner = DirectoryScanner::new(root, 2, AcceptAllFilter);
        let events = scanner.poll().expect("poll");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Created);
        assert_eq!(events[0].path, file);
        assert_eq!(events[0].size, 9);
    }

    #[test]
    fn test_unchanged_file_becomes_stable_once() {
        let (_dir, root) = temp_dir();
        let file = root.join("orders.csv");
        append(&file, b"data");

        let mut scanner = DirectoryScanner::new(root, 2, AcceptAllFilter);

        // Poll 1: created. Polls 2-3: quiet. Poll 3 crosses the threshold.
        assert_eq!(
            kinds_for(&scanner.poll().expect("poll"), &file),
            vec![&EventKind::Created]
        );
        assert!(scanner.poll().expect("poll").is_empty());
        assert_eq!(
            kinds_for(&scanner.poll().expect("poll"), &file),
            vec![&EventKind::Stable]
        );

        // Stable is edge-triggered: further quiet polls are silent
        assert!(scanner.poll().expect("poll").is_empty());
        assert!(scanner.poll().expect("poll").is_empty());
    }

    #[test]
    fn test_growth_reported_modified_and_resets_stability() {
        let (_dir, root) = temp_dir();
        let file = root.join("feed.ndjson");
        append(&file, b"line one\n");

        let mut scanner = DirectoryScanner::new(root, 1, AcceptAllFilter);
        scanner.poll().expect("poll");
        assert_eq!(
            kinds_for(&scanner.poll().expect("poll"), &file),
            vec![&EventKind::Stable]
        );

        append(&file, b"line two\n");
        let events = scanner.poll().expect("poll");
        assert_eq!(kinds_for(&events, &file), vec![&EventKind::Modified]);
        assert_eq!(events[0].size, 18);

        // A new quiet period earns a second stable event
        assert_eq!(
            kinds_for(&scanner.poll().expect("poll"), &file),
            vec![&EventKind::Stable]
        );
    }

    #[test]
    fn test_removed_file_reported_and_forgotten() {
        let (_dir, root) = temp_dir();
        let file = root.join("orders.csv");
        append(&file, b"data");

        let mut scanner = DirectoryScanner::new(root, 2, AcceptAllFilter);
        scanner.poll().expect("poll");
        assert_eq!(scanner.tracked_count(), 1);

        std::fs::remove_file(&file).expect("remove");
        let events = scanner.poll().expect("poll");
        assert_eq!(kinds_for(&events, &file), vec![&EventKind::Removed]);
        assert_eq!(scanner.tracked_count(), 0);

        // Reappearing under the same name is a fresh created
        append(&file, b"new data");
        assert_eq!(
            kinds_for(&scanner.poll().expect("poll"), &file),
            vec![&EventKind::Created]
        );
    }

    #[test]
    fn test_subdirectories_skipped() {
        let (_dir, root) = temp_dir();
        std::fs::create_dir(root.join("nested")).expect("mkdir");
        append(&root.join("nested").join("deep.csv"), b"data");

        let mut scanner = DirectoryScanner::new(root, 2, AcceptAllFilter);
        assert!(scanner.poll().expect("poll").is_empty());
        assert_eq!(scanner.tracked_count(), 0);
    }

    #[test]
    fn test_filtered_files_invisible() {
        let (_dir, root) = temp_dir();
        append(&root.join("orders.csv"), b"data");
        append(&root.join("orders.tmp"), b"data");

        let mut scanner = DirectoryScanner::new(root.clone(), 2, ExtensionFilter::new(&["csv"]));
        let events = scanner.poll().expect("poll");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].path, root.join("orders.csv"));
        assert_eq!(scanner.tracked_count(), 1);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let mut scanner = DirectoryScanner::new(
            Utf8PathBuf::from("/nonexistent/watch/dir"),
            2,
            AcceptAllFilter,
        );
        let err = scanner.poll().unwrap_err();
        assert!(matches!(err, WatchError::Io(_)));
    }

    #[test]
    fn test_multiple_files_tracked_independently() {
        let (_dir, root) = temp_dir();
        let quiet = root.join("quiet.csv");
        let busy = root.join("busy.ndjson");
        append(&quiet, b"done");
        append(&busy, b"start");

        let mut scanner = DirectoryScanner::new(root, 1, AcceptAllFilter);
        scanner.poll().expect("poll");

        append(&busy, b" more");
        let events = scanner.poll().expect("poll");

        // The quiet file goes stable while the busy one reports growth
        assert_eq!(kinds_for(&events, &quiet), vec![&EventKind::Stable]);
        assert_eq!(kinds_for(&events, &busy), vec![&EventKind::Modified]);
    }
}
