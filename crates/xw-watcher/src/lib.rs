//! Stat-polling directory watcher with stability classification.
//!
//! This crate detects file activity in a drop directory by polling with
//! `stat` on a fixed interval and diffing against the previous snapshot,
//! bridged to an async tokio context for consumption by the archival
//! engine.
//!
//! # Overview
//!
//! The xw-watcher crate is designed to:
//!
//! - Detect files being created, appended to, and removed in a flat
//!   drop directory
//! - Classify a file as *stable* once it has been unchanged for a
//!   configured number of consecutive polls
//! - Filter files at the source so ignored names never enter tracking
//! - Stream classified events asynchronously to the archival engine
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
//! # Crate Dependencies
//!
//! ```text
//! xw-cli ──► xw-archive ──► xw-core
//!        ├─► xw-watcher ──►
//! ```
//!
//! # Usage
//!
//! ## Basic Watching
//!
//! ```no_run
//! use xw_watcher::{AcceptAllFilter, DirectoryWatcher};
//! use xw_core::WatchConfig;
//! use camino::Utf8Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WatchConfig::default(); // 1s interval, 2 quiet polls
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
//!
//! ## Using with `tokio::select!`
//!
//! ```no_run
//! use xw_watcher::{AcceptAllFilter, DirectoryWatcher};
//! use xw_core::WatchConfig;
//! use camino::Utf8Path;
//!
//! # async fn example() -> Result<(), xw_watcher::WatchError> {
//! let config = WatchConfig::default();
//! let mut watcher = DirectoryWatcher::new(
//!     Utf8Path::new("/tmp/input"),
//!     &config,
//!     AcceptAllFilter,
//! ).await?;
//!
//! loop {
//!     tokio::select! {
//!         Some(event) = watcher.recv() => {
//!             println!("{event}");
//!         }
//!         _ = tokio::signal::ctrl_c() => {
//!             break;
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Why Polling
//!
//! Stability classification needs a size observation per interval anyway,
//! so an inotify-style backend would still have to stat on a timer to
//! decide when a file stops growing. Polling keeps one code path, and it
//! behaves identically on network mounts where kernel notification does
//! not fire.
//!
//! # Performance Considerations
//!
//! - **Filtering at Source**: Files are filtered in the blocking thread
//!   before any state is kept for them.
//!
//! - **Bounded Channel**: The event channel has a capacity of 100 events
//!   by default, preventing unbounded memory growth if the consumer is slow.
//!
//! - **UTF-8 Paths**: All paths are validated as UTF-8 early, avoiding
//!   repeated conversion overhead and ensuring consistent path handling.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod filter;
pub mod scanner;
pub mod watcher;

// Re-export error types
pub use error::WatchError;

// Re-export filter types
pub use filter::{AcceptAllFilter, CompositeFilter, ExtensionFilter, FileFilter};

// Re-export scanner and watcher types
pub use scanner::DirectoryScanner;
pub use watcher::DirectoryWatcher;
