//! Core types, errors, and utilities for the extraction-watcher tool.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - Configuration structures ([`ArchiveConfig`], [`WatchConfig`], [`Config`])
//! - The [`Event`] type exchanged between the watcher and the archival engine
//! - Error types for consistent error handling
//! - Type aliases for `FxHashMap`/`FxHashSet` (faster than std)

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod event;
pub mod hash;

pub use config::{ArchiveConfig, Config, WatchConfig};
pub use error::ConfigError;
pub use event::{Event, EventKind};
pub use hash::{fx_hash_map, fx_hash_set, FxBuildHasher, FxHashMap, FxHashSet};
