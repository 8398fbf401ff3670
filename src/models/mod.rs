//! Data models for the analysis pipeline.
//!
//! This module contains the core data structures used throughout the crate:
//! - [`DialyzerConfig`]: Analysis settings, project layout, and backend
//!   settings loaded from `autoplt.yaml`
//! - [`FileSet`]: Deterministic set of compiled-object file paths with the
//!   set operations the sync algorithm is built on
//! - [`SyncPartition`]: The remove/check/add partitioning of an old/new
//!   file-set pair
//!
//! # Architecture Note
//!
//! Config structs derive `Serialize`/`Deserialize` for YAML persistence and
//! are read-only to the core: they are loaded once per run by
//! [`ConfigManager`](crate::config::ConfigManager) and threaded by reference
//! through the services.

pub mod config;
pub mod file_set;

pub use config::{
    AnalysisSettings, BackendSettings, BasePltLocation, DialyzerConfig, PltLocation, ProjectApp,
    ProjectLayout,
};
pub use file_set::{FileSet, SyncPartition};
