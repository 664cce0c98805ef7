//! File filtering for watch events.
//!
//! This module provides traits and implementations for filtering files
//! before their events are sent to the event channel. Filtering at the
//! scanner keeps ignored files out of the stability bookkeeping entirely,
//! so they never occupy a tracking slot or produce channel traffic.
//!
//! # Design
//!
//! The [`FileFilter`] trait defines a simple predicate for determining
//! whether a file should be tracked. Implementations can filter by:
//!
//! - File extension (e.g., only csv exports)
//! - Path patterns (e.g., exclude temp files)
//!
//! # Examples
//!
//! ```
//! use xw_watcher::{FileFilter, ExtensionFilter};
//! use camino::Utf8Path;
//!
//! let filter = ExtensionFilter::new(&["csv", "ndjson"]);
//!
//! assert!(filter.should_process(Utf8Path::new("/in/orders.csv")));
//! assert!(!filter.should_process(Utf8Path::new("/in/orders.csv.tmp")));
//! ```

use camino::Utf8Path;
use smallvec::SmallVec;

/// A filter for determining which files to track.
///
/// Implementations of this trait are called for each regular file found
/// during a scan. Files that return `false` from [`should_process`] are
/// invisible to the watcher: they produce no events and no state.
///
/// # Thread Safety
///
/// Filters must be [`Send`] and [`Sync`] because they are used from the
/// blocking polling thread. They must also be `'static` to be moved into
/// the spawned task.
///
/// # Examples
///
/// ```
/// use xw_watcher::FileFilter;
/// use camino::Utf8Path;
///
/// struct NoHiddenFiles;
///
/// impl FileFilter for NoHiddenFiles {
///     fn should_process(&self, path: &Utf8Path) -> bool {
///         !path.file_name().is_some_and(|n| n.starts_with('.'))
///     }
/// }
/// ```
///
/// [`should_process`]: FileFilter::should_process
pub trait FileFilter: Send + Sync + 'static {
    /// Returns `true` if the file at the given path should be tracked.
    fn should_process(&self, path: &Utf8Path) -> bool;
}

/// A filter that accepts all files.
///
/// This is the default posture for an extraction drop directory: every
/// file that lands in it is assumed to be payload.
///
/// # Examples
///
/// ```
/// use xw_watcher::{FileFilter, AcceptAllFilter};
/// use camino::Utf8Path;
///
/// let filter = AcceptAllFilter;
/// assert!(filter.should_process(Utf8Path::new("anything.bin")));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllFilter;

impl FileFilter for AcceptAllFilter {
    #[inline]
    fn should_process(&self, _path: &Utf8Path) -> bool {
        true
    }
}

/// A filter based on file extensions.
///
/// Accepts files with any of the specified extensions.
///
/// # Examples
///
/// ```
/// use xw_watcher::{FileFilter, ExtensionFilter};
/// use camino::Utf8Path;
///
/// let filter = ExtensionFilter::new(&["csv", "json", "ndjson"]);
/// assert!(filter.should_process(Utf8Path::new("/in/orders.csv")));
/// assert!(filter.should_process(Utf8Path::new("/in/feed.ndjson")));
/// assert!(!filter.should_process(Utf8Path::new("/in/feed.zip")));
/// ```
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: SmallVec<[String; 8]>,
}

impl ExtensionFilter {
    /// Creates a new extension filter.
    ///
    /// # Arguments
    ///
    /// * `extensions` - The extensions to accept (without the leading dot)
    #[must_use]
    pub fn new(extensions: &[&str]) -> Self {
        Self {
            extensions: extensions.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    /// Creates an extension filter from owned strings.
    #[must_use]
    pub fn from_owned(extensions: Vec<String>) -> Self {
        Self {
            extensions: extensions.into_iter().collect(),
        }
    }
}

impl FileFilter for ExtensionFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

/// A composite filter that combines multiple filters with AND logic.
///
/// All filters must return `true` for the file to be tracked.
///
/// # Examples
///
/// ```
/// use xw_watcher::{FileFilter, ExtensionFilter, CompositeFilter};
/// use camino::Utf8Path;
///
/// struct NoPartialUploads;
/// impl FileFilter for NoPartialUploads {
///     fn should_process(&self, path: &Utf8Path) -> bool {
///         !path.as_str().ends_with(".partial")
///     }
/// }
///
/// let filter = CompositeFilter::new()
///     .and(ExtensionFilter::new(&["csv"]))
///     .and(NoPartialUploads);
///
/// assert!(filter.should_process(Utf8Path::new("/in/orders.csv")));
/// assert!(!filter.should_process(Utf8Path::new("/in/orders.csv.partial")));
/// ```
pub struct CompositeFilter {
    filters: Vec<Box<dyn FileFilter>>,
}

impl CompositeFilter {
    /// Creates a new empty composite filter.
    ///
    /// An empty composite filter accepts all files.
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Adds a filter to the composite.
    #[must_use]
    pub fn and<F: FileFilter>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl Default for CompositeFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl FileFilter for CompositeFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        self.filters.is_empty() || self.filters.iter().all(|f| f.should_process(path))
    }
}

// Implement FileFilter for boxed filters
impl<F: FileFilter + ?Sized> FileFilter for Box<F> {
    fn should_process(&self, path: &Utf8Path) -> bool {
        (**self).should_process(path)
    }
}

// Implement FileFilter for Arc-wrapped filters (useful for shared filters)
impl<F: FileFilter + ?Sized> FileFilter for std::sync::Arc<F> {
    fn should_process(&self, path: &Utf8Path) -> bool {
        (**self).should_process(path)
    }
}
