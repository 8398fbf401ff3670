// autoplt - Incremental Dialyzer driver with PLT maintenance
//
// This is the library crate containing the core business logic and data structures.
// The binary crate (main.rs) provides the command-line entry point.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use error::DialyzerError;
pub use models::{DialyzerConfig, FileSet, SyncPartition};
pub use services::{DialyzerBackend, PhaseOrchestrator};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
