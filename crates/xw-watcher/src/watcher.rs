//! Directory watcher with async event streaming.
//!
//! This module provides the [`DirectoryWatcher`] type that bridges the
//! synchronous stat-polling scanner to the async tokio runtime.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Blocking Thread (spawn_blocking)             │
//! │  ┌──────────────────┐    ┌────────────────┐    ┌────────────┐  │
//! │  │ poll interval    │ -> │ DirectoryScanner│ -> │ classified │  │
//! │  │ (thread::sleep)  │    │ (stat + diff)  │    │ events     │  │
//! │  └──────────────────┘    └────────────────┘    └─────┬──────┘  │
//! └──────────────────────────────────────────────────────│─────────┘
//!                                                        │
//!                                          blocking_send │
//!                                                        ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Async Runtime (tokio)                        │
//! │  ┌──────────────────┐    ┌────────────────┐                     │
//! │  │ DirectoryWatcher │    │ mpsc::Receiver │ -> archival engine  │
//! │  │ (shutdown ctrl)  │    │ (events)       │                     │
//! │  └──────────────────┘    └────────────────┘                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Polling was chosen over inotify-style watching on purpose: stability
//! classification needs a size observation per interval anyway, so an
//! event-driven backend would still have to stat on a timer. Polling also
//! behaves identically on network mounts, where inotify does not fire.
//!
//! # Usage
//!
//! ```no_run
//! use xw_watcher::{AcceptAllFilter, DirectoryWatcher};
//! use xw_core::WatchConfig;
//! use camino::Utf8Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WatchConfig::default();
//!     let path = Utf8Path::new("/tmp/input");
//!
//!     let mut watcher = DirectoryWatcher::new(path, &config, AcceptAllFilter).await?;
//!
//!     while let Some(event) = watcher.recv().await {
//!         println!("{event}");
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use xw_core::{Event, WatchConfig};

use crate::error::WatchError;
use crate::filter::FileFilter;
use crate::scanner::DirectoryScanner;

/// Default channel capacity for watch events.
const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// A directory watcher that streams classified events to an async context.
///
/// `DirectoryWatcher` manages a background thread that polls the watched
/// directory on a fixed interval, classifies changes, and sends the
/// resulting events through a tokio mpsc channel for consumption in async
/// code.
///
/// # Lifecycle
///
/// 1. **Creation**: `DirectoryWatcher::new()` validates the path, creates
///    channels, and spawns a blocking task with the polling scanner.
///
/// 2. **Event Reception**: Use `recv()` or `try_recv()` to receive events.
///    Events are already filtered according to the provided filter.
///
/// 3. **Shutdown**: Call `shutdown()` for graceful shutdown, or simply drop
///    the watcher. Dropping sends a shutdown signal; the polling thread
///    notices it on its next wakeup.
///
/// # Thread Safety
///
/// The watcher can be used from any async task. The polling loop runs in a
/// dedicated blocking thread managed by tokio's blocking pool.
///
/// # Examples
///
/// ```no_run
/// use xw_watcher::{AcceptAllFilter, DirectoryWatcher};
/// use xw_core::WatchConfig;
/// use camino::Utf8Path;
///
/// # async fn example() -> Result<(), xw_watcher::WatchError> {
/// let config = WatchConfig::default();
/// let mut watcher = DirectoryWatcher::new(
///     Utf8Path::new("/tmp/input"),
///     &config,
///     AcceptAllFilter,
/// ).await?;
///
/// while let Some(event) = watcher.recv().await {
///     println!("changed: {}", event.path);
/// }
/// # Ok(())
/// # }
/// ```
pub struct DirectoryWatcher {
    /// Shutdown signal sender.
    ///
    /// Sending on this channel signals the blocking task to stop.
    /// Set to `None` after shutdown is initiated.
    shutdown_tx: Option<oneshot::Sender<()>>,

    /// Handle to the blocking polling task.
    ///
    /// Used to await completion during shutdown.
    task_handle: Option<JoinHandle<Result<(), WatchError>>>,

    /// Event receiver for async consumption.
    event_rx: mpsc::Receiver<Event>,

    /// The directory being watched.
    watch_path: Utf8PathBuf,
}

impl std::fmt::Debug for DirectoryWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryWatcher")
            .field("watch_path", &self.watch_path)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl DirectoryWatcher {
    /// Creates a new watcher for the specified directory.
    ///
    /// This method:
    /// 1. Validates that the path exists and is a directory
    /// 2. Creates the event channel
    /// 3. Spawns a blocking task running the polling loop
    ///
    /// # Arguments
    ///
    /// * `path` - The directory to watch (must exist)
    /// * `config` - Watch configuration (poll interval, stability polls)
    /// * `filter` - Filter to determine which files to track
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::PathNotFound`] if the path doesn't exist and
    /// [`WatchError::NotADirectory`] if it is not a directory.
    #[allow(clippy::unused_async)] // Async for API consistency with shutdown()
    pub async fn new<F: FileFilter>(
        path: &Utf8Path,
        config: &WatchConfig,
        filter: F,
    ) -> Result<Self, WatchError> {
        Self::with_capacity(path, config, filter, DEFAULT_CHANNEL_CAPACITY).await
    }

    /// Creates a watcher with a custom channel capacity.
    ///
    /// Use this when a single poll can discover many files at once (a bulk
    /// drop into the directory) and the default capacity would block the
    /// polling thread on a slow consumer.
    #[allow(clippy::unused_async)] // Async for API consistency with shutdown()
    pub async fn with_capacity<F: FileFilter>(
        path: &Utf8Path,
        config: &WatchConfig,
        filter: F,
        channel_capacity: usize,
    ) -> Result<Self, WatchError> {
        if !path.exists() {
            return Err(WatchError::path_not_found(path));
        }
        if !path.is_dir() {
            return Err(WatchError::not_a_directory(path));
        }

        // Canonicalize so events carry absolute paths
        let watch_path = path.canonicalize_utf8().map_err(WatchError::Io)?;

        let (event_tx, event_rx) = mpsc::channel(channel_capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task_path = watch_path.clone();
        let poll_interval_ms = config.poll_interval_ms;
        let stability_polls = config.stability_polls;

        let task_handle = tokio::task::spawn_blocking(move || {
            run_poll_loop(
                task_path,
                poll_interval_ms,
                stability_polls,
                event_tx,
                shutdown_rx,
                filter,
            )
        });

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            task_handle: Some(task_handle),
            event_rx,
            watch_path,
        })
    }

    /// Receives the next watch event asynchronously.
    ///
    /// Returns `None` when the watcher has been shut down or the channel
    /// is closed.
    pub async fn recv(&mut self) -> Option<Event> {
        self.event_rx.recv().await
    }

    /// Tries to receive a watch event without blocking.
    ///
    /// Returns `Ok(event)` if an event is available, `Err(TryRecvError::Empty)`
    /// if the channel is empty, or `Err(TryRecvError::Disconnected)` if the
    /// watcher has been shut down.
    pub fn try_recv(&mut self) -> Result<Event, mpsc::error::TryRecvError> {
        self.event_rx.try_recv()
    }

    /// Returns a mutable reference to the event receiver.
    ///
    /// This is useful when you need to use the receiver directly with
    /// `tokio::select!` or other channel operations.
    pub fn events(&mut self) -> &mut mpsc::Receiver<Event> {
        &mut self.event_rx
    }

    /// Returns the directory being watched.
    #[must_use]
    pub fn watch_path(&self) -> &Utf8Path {
        &self.watch_path
    }

    /// Returns `true` if the watcher is still running.
    ///
    /// The watcher may stop running if the shutdown signal is sent or
    /// if an error occurs in the blocking task.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some() && self.task_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Gracefully shuts down the watcher.
    ///
    /// This method:
    /// 1. Sends the shutdown signal to the blocking task
    /// 2. Awaits the task to complete
    /// 3. Returns any error from the polling thread
    ///
    /// # Errors
    ///
    /// Returns an error if the polling thread panicked or encountered
    /// an error during operation.
    pub async fn shutdown(mut self) -> Result<(), WatchError> {
        // Send shutdown signal
        if let Some(tx) = self.shutdown_tx.take() {
            // Ignore error if receiver is already dropped
            let _ = tx.send(());
        }

        // Await task completion
        if let Some(handle) = self.task_handle.take() {
            match handle.await {
                Ok(result) => result?,
                Err(_join_error) => return Err(WatchError::ChannelClosed),
            }
        }

        Ok(())
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        // Send shutdown signal on drop
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        // Note: We don't await the task here since Drop is sync.
        // The task will stop on its next wakeup.
    }
}

/// Runs the polling loop in a blocking context.
///
/// This function is called from `spawn_blocking`. It owns the scanner and
/// alternates between sleeping for the poll interval and scanning, checking
/// for a shutdown signal on every wakeup.
#[allow(clippy::needless_pass_by_value)] // Path must be owned for the blocking task lifetime
fn run_poll_loop<F: FileFilter>(
    path: Utf8PathBuf,
    poll_interval_ms: u64,
    stability_polls: u32,
    event_tx: mpsc::Sender<Event>,
    mut shutdown_rx: oneshot::Receiver<()>,
    filter: F,
) -> Result<(), WatchError> {
    let interval = Duration::from_millis(poll_interval_ms);
    let mut scanner = DirectoryScanner::new(path.clone(), stability_polls, filter);

    tracing::info!(path = %path, interval_ms = poll_interval_ms, "directory watcher started");

    loop {
        match shutdown_rx.try_recv() {
            Ok(()) | Err(oneshot::error::TryRecvError::Closed) => break,
            Err(oneshot::error::TryRecvError::Empty) => {}
        }

        match scanner.poll() {
            Ok(events) => {
                for event in events {
                    if event_tx.blocking_send(event).is_err() {
                        tracing::debug!("event channel closed, stopping watcher");
                        return Ok(());
                    }
                }
            }
            // A failed scan is not fatal; the directory may reappear
            Err(error) => tracing::warn!(path = %path, error = %error, "directory poll failed"),
        }

        std::thread::sleep(interval);
    }

    tracing::info!(path = %path, "directory watcher stopped");

    Ok(())
}
