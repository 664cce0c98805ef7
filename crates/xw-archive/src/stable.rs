//! Whole-file archival for files the watcher reports as stable.
//!
//! [`StableFileArchiver`] consumes `stable` events: each event's file is
//! added in full to the rotating archive family under a collision-free entry
//! name. Every `commit_every` additions the archive is committed to disk and
//! checked against the rotation threshold, so its contents are durable and
//! readable without waiting for rotation or shutdown.
//!
//! Adding the same source path twice is not idempotent: the file is archived
//! twice under two different entry names. The upstream watcher should not
//! deliver the same stable event twice for one file generation, but if it
//! does the duplication is observable rather than silently suppressed.

use camino::Utf8Path;
use tracing::debug;

use xw_core::ArchiveConfig;

use crate::dedup::NameDeduplicator;
use crate::error::ArchiveError;
use crate::rotator::ArchiveRotator;

/// Adds whole stable files to the rotating archive family.
#[derive(Debug)]
pub struct StableFileArchiver {
    /// Entry-name collision resolution, scoped to the whole family.
    dedup: NameDeduplicator,

    /// The rotating archive this archiver writes into.
    rotator: ArchiveRotator,

    /// Total number of files added so far.
    additions: u64,

    /// Addition count between forced commits.
    commit_every: u64,

    /// Archive size that triggers rotation, checked at each commit.
    rotate_threshold_bytes: u64,
}

impl StableFileArchiver {
    /// Opens part 1 of the stable archive family per the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Create`] if the first part cannot be created.
    pub fn new(config: &ArchiveConfig) -> Result<Self, ArchiveError> {
        let rotator = ArchiveRotator::new(
            &config.output_dir,
            &config.output_prefix,
            &config.stable_archive_name,
        )?;
        Ok(Self {
            dedup: NameDeduplicator::new(),
            rotator,
            additions: 0,
            commit_every: config.commit_every,
            rotate_threshold_bytes: config.rotate_threshold_bytes,
        })
    }

    /// Archives the file at `path` in full.
    ///
    /// The entry name is the file's base name, renamed deterministically on
    /// collision. Every `commit_every` additions the archive is committed
    /// and rotated if it crossed the size threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::MissingFileName`] if the path has no final
    /// component; otherwise propagates I/O and zip errors from the rotator
    /// unchanged.
    pub fn add(&mut self, path: &Utf8Path) -> Result<(), ArchiveError> {
        let base_name = path
            .file_name()
            .ok_or_else(|| ArchiveError::MissingFileName {
                path: path.to_owned(),
            })?;

        let entry_name = self.dedup.resolve(base_name);
        if entry_name != base_name {
            debug!(original = base_name, renamed = %entry_name, "duplicate name resolved");
        }

        self.rotator.add(&entry_name, path)?;
        self.additions += 1;
        debug!(
            count = self.additions,
            entry = %entry_name,
            archive = %self.rotator.current_path(),
            "stable file added"
        );

        if self.additions % self.commit_every == 0 {
            self.rotator
                .commit_and_maybe_rotate(self.rotate_threshold_bytes)?;
        }
        Ok(())
    }

    /// Performs a final commit and seals the currently open part.
    ///
    /// Called on shutdown flush. Returns the final size of the sealed part.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Commit`] if finalizing fails.
    pub fn close(&mut self) -> Result<u64, ArchiveError> {
        debug!(
            additions = self.additions,
            archive = %self.rotator.current_path(),
            "closing stable archive"
        );
        self.rotator.seal()
    }

    /// Returns the total number of files added so far.
    #[must_use]
    pub fn additions(&self) -> u64 {
        self.additions
    }

    /// Returns the part number of the currently open archive.
    #[must_use]
    pub fn part_number(&self) -> u32 {
        self.rotator.part_number()
    }

    /// Returns the path of the currently open archive part.
    #[must_use]
    pub fn current_path(&self) -> &Utf8Path {
        self.rotator.current_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::fs::File;
    use tempfile::TempDir;

    fn temp_dir() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 path");
        (dir, path)
    }

    fn config_for(root: &Utf8Path) -> ArchiveConfig {
        ArchiveConfig {
            input_dir: root.join("in"),
            output_dir: root.to_owned(),
            ..ArchiveConfig::default()
        }
    }

    fn entry_names(archive_path: &Utf8Path) -> Vec<String> {
        let file = File::open(archive_path).expect("open archive");
        let archive = zip::ZipArchive::new(file).expect("parse archive");
        let mut names: Vec<String> = archive.file_names().map(ToOwned::to_owned).collect();
        names.sort();
        names
    }

    #[test]
    fn test_three_duplicate_names() {
        let (_dir, root) = temp_dir();

        // Three different source files that all carry the same base name
        let mut sources = Vec::new();
        for i in 0..3 {
            let subdir = root.join(format!("batch{i}"));
            std::fs::create_dir(&subdir).expect("create subdir");
            let path = subdir.join("report.csv");
            std::fs::write(&path, format!("batch {i}\n")).expect("write source");
            sources.push(path);
        }

        let mut archiver = StableFileArchiver::new(&config_for(&root)).expect("create");
        for source in &sources {
            archiver.add(source).expect("add");
        }
        archiver.close().expect("close");

        assert_eq!(
            entry_names(&root.join("stables.zip")),
            vec![
                "report.csv".to_owned(),
                "report_duplicate_2.csv".to_owned(),
                "report_duplicate_3.csv".to_owned(),
            ]
        );
    }

    #[test]
    fn test_commit_cadence_and_rotation() {
        let (_dir, root) = temp_dir();
        let source = root.join("data.txt");
        std::fs::write(&source, "payload that compresses into something\n").expect("write");

        let config = ArchiveConfig {
            output_dir: root.clone(),
            commit_every: 1,
            // Any non-empty committed zip exceeds one byte, so every commit rotates
            rotate_threshold_bytes: 1,
            ..ArchiveConfig::default()
        };

        let mut archiver = StableFileArchiver::new(&config).expect("create");
        archiver.add(&source).expect("add 1");
        assert_eq!(archiver.part_number(), 2);
        archiver.add(&source).expect("add 2");
        assert_eq!(archiver.part_number(), 3);
        archiver.close().expect("close");

        assert_eq!(
            entry_names(&root.join("stables.zip")),
            vec!["data.txt".to_owned()]
        );
        // The deduplicator is family-wide, so part 2 holds the renamed entry
        assert_eq!(
            entry_names(&root.join("stables_part2.zip")),
            vec!["data_duplicate_2.txt".to_owned()]
        );
    }

    #[test]
    fn test_no_commit_before_cadence() {
        let (_dir, root) = temp_dir();
        let source = root.join("data.txt");
        std::fs::write(&source, "x").expect("write");

        let mut archiver = StableFileArchiver::new(&config_for(&root)).expect("create");
        // Default cadence is 100, so 3 additions never commit or rotate
        for _ in 0..3 {
            archiver.add(&source).expect("add");
        }
        assert_eq!(archiver.part_number(), 1);
        assert_eq!(archiver.additions(), 3);
        archiver.close().expect("close");
    }

    #[test]
    fn test_double_delivery_is_observable_duplication() {
        let (_dir, root) = temp_dir();
        let source = root.join("once.csv");
        std::fs::write(&source, "same file twice").expect("write");

        let mut archiver = StableFileArchiver::new(&config_for(&root)).expect("create");
        archiver.add(&source).expect("first");
        archiver.add(&source).expect("second");
        archiver.close().expect("close");

        assert_eq!(
            entry_names(&root.join("stables.zip")),
            vec!["once.csv".to_owned(), "once_duplicate_2.csv".to_owned()]
        );
    }

    #[test]
    fn test_add_missing_source_propagates() {
        let (_dir, root) = temp_dir();
        let mut archiver = StableFileArchiver::new(&config_for(&root)).expect("create");

        let err = archiver.add(&root.join("never-existed.csv")).unwrap_err();
        assert!(err.is_vanished_source());
    }
}
