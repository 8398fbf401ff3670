//! autoplt - Incremental Dialyzer driver with PLT maintenance
//!
//! Main entry point for the command-line tool.
//!
//! # Overview
//!
//! This binary wires the library crate into a runnable pipeline. It
//! initializes:
//! - Configuration loading ([`ConfigManager`] - `autoplt.yaml`)
//! - Logging infrastructure (file rotation + console output)
//! - Tokio async runtime (current-thread: the pipeline is strictly
//!   sequential, one thread is all it needs)
//! - The production backend ([`DialyzerBackend`] - drives the `dialyzer`
//!   escript)
//! - The run state machine ([`PhaseOrchestrator`])
//!
//! # Execution Flow
//!
//! 1. Load autoplt.yaml from the configuration directory (first process
//!    argument, default ".")
//! 2. Initialize logging → logs/autoplt.<date>
//! 3. Build a current-thread tokio runtime and block on the orchestrated
//!    run: PLT update-or-build, then the success-typing pass
//! 4. Map the outcome to the exit status: clean run → 0; warnings or any
//!    fatal error → non-zero with a descriptive message
//!
//! Diagnostic lines stream to stdout as they are produced and accumulate in
//! `<base_dir>/<runtime-version>.dialyzer_warnings`.

use anyhow::{Context, Result};
use autoplt::{APP_NAME, ConfigManager, DialyzerBackend, PhaseOrchestrator, VERSION};

fn main() -> Result<()> {
    // Single optional argument: the configuration directory. Flag parsing
    // belongs to whatever host tool wraps this binary.
    let config_dir = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());

    let config_manager = ConfigManager::new(config_dir.as_str())?;
    let config = config_manager.load_config()?;

    // Logging comes up after the config read so the debug flag applies;
    // anything traced before this line is dropped.
    let _log_guard = autoplt::logging::setup_logging("logs", "autoplt", config.debug_mode, true)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    tracing::info!(
        "Configuration: {} project app(s), {} lib dir(s), backend {}",
        config.project.apps.len(),
        config.project.lib_dirs.len(),
        config.backend.dialyzer_bin
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let backend = DialyzerBackend::new(&config.backend.dialyzer_bin);
    let mut orchestrator = PhaseOrchestrator::new(&backend, &config);

    let result = runtime.block_on(orchestrator.run());

    match result {
        Ok(()) => {
            tracing::info!("Analysis passed with no warnings");
            Ok(())
        }
        Err(err) => {
            if !err.is_warnings() {
                tracing::error!("Analysis failed: {}", err);
            }
            Err(err.into())
        }
    }
}
