//! Collision-free entry naming within one archive family.
//!
//! Files arriving from different subdirectories frequently share a base name
//! (every export batch ships a `report.csv`). Zip entries are flat, so the
//! second and later sightings of a base name must be renamed before they are
//! added. The rename is a deterministic function of the base name and its
//! occurrence count, so re-running the same input sequence yields the same
//! entry names.
//!
//! The counter map is scoped to the whole archive family, not to a single
//! rotated part: a name that collides across two parts of the same family is
//! still renamed, which keeps entry names unique across the family as well.
//!
//! # Examples
//!
//! ```
//! use xw_archive::NameDeduplicator;
//!
//! let mut dedup = NameDeduplicator::new();
//! assert_eq!(dedup.resolve("report.csv"), "report.csv");
//! assert_eq!(dedup.resolve("report.csv"), "report_duplicate_2.csv");
//! assert_eq!(dedup.resolve("report.csv"), "report_duplicate_3.csv");
//! ```

use xw_core::FxHashMap;

/// Splits a file name at the last extension separator.
///
/// Returns `(stem, extension)` where the extension includes the leading dot.
/// A leading dot (`.bashrc`) is not treated as an extension separator.
pub(crate) fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

/// Assigns collision-free entry names inside one archive family's namespace.
///
/// Pure bookkeeping: no I/O, no error conditions. The only side effect of
/// [`resolve`](Self::resolve) is mutating the occurrence-counter map.
#[derive(Debug, Clone, Default)]
pub struct NameDeduplicator {
    /// Base file name to occurrence count. Starts at 1 on first sighting.
    counts: FxHashMap<String, u32>,
}

impl NameDeduplicator {
    /// Creates an empty deduplicator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a base file name to a collision-free archive entry name.
    ///
    /// The first call with a given base name returns it unchanged and records
    /// it with count 1. Every subsequent call with the same base name
    /// increments the stored count and returns
    /// `{stem}_duplicate_{count}{ext}`, split at the last extension separator.
    #[must_use]
    pub fn resolve(&mut self, base_name: &str) -> String {
        if let Some(count) = self.counts.get_mut(base_name) {
            *count += 1;
            let (stem, ext) = split_extension(base_name);
            format!("{stem}_duplicate_{count}{ext}")
        } else {
            self.counts.insert(base_name.to_owned(), 1);
            base_name.to_owned()
        }
    }

    /// Returns how many times a base name has been seen, if at all.
    #[must_use]
    pub fn occurrences(&self, base_name: &str) -> Option<u32> {
        self.counts.get(base_name).copied()
    }

    /// Returns the number of distinct base names seen so far.
    #[must_use]
    pub fn distinct_names(&self) -> usize {
        self.counts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sighting_unchanged() {
        let mut dedup = NameDeduplicator::new();
        assert_eq!(dedup.resolve("report.csv"), "report.csv");
        assert_eq!(dedup.occurrences("report.csv"), Some(1));
    }

    #[test]
    fn test_duplicate_sequence() {
        let mut dedup = NameDeduplicator::new();
        let names: Vec<String> = (0..5).map(|_| dedup.resolve("x.txt")).collect();
        assert_eq!(
            names,
            vec![
                "x.txt",
                "x_duplicate_2.txt",
                "x_duplicate_3.txt",
                "x_duplicate_4.txt",
                "x_duplicate_5.txt",
            ]
        );

        // All distinct
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), names.len());
    }

    #[test]
    fn test_independent_names() {
        let mut dedup = NameDeduplicator::new();
        assert_eq!(dedup.resolve("a.csv"), "a.csv");
        assert_eq!(dedup.resolve("b.csv"), "b.csv");
        assert_eq!(dedup.resolve("a.csv"), "a_duplicate_2.csv");
        assert_eq!(dedup.resolve("b.csv"), "b_duplicate_2.csv");
        assert_eq!(dedup.distinct_names(), 2);
    }

    #[test]
    fn test_name_without_extension() {
        let mut dedup = NameDeduplicator::new();
        assert_eq!(dedup.resolve("Makefile"), "Makefile");
        assert_eq!(dedup.resolve("Makefile"), "Makefile_duplicate_2");
    }

    #[test]
    fn test_leading_dot_is_not_extension() {
        let mut dedup = NameDeduplicator::new();
        assert_eq!(dedup.resolve(".bashrc"), ".bashrc");
        assert_eq!(dedup.resolve(".bashrc"), ".bashrc_duplicate_2");
    }

    #[test]
    fn test_multiple_dots_split_at_last() {
        let mut dedup = NameDeduplicator::new();
        assert_eq!(dedup.resolve("data.tar.gz"), "data.tar.gz");
        assert_eq!(dedup.resolve("data.tar.gz"), "data.tar_duplicate_2.gz");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("report.csv"), ("report", ".csv"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension("Makefile"), ("Makefile", ""));
        assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
    }
}
