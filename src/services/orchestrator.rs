//! Top-level run sequencing.
//!
//! One run walks a fixed state machine:
//!
//! 1. `update_plt` disabled → skip straight to success typing.
//! 2. Project PLT exists → sync it against the project-required set.
//! 3. No project PLT → update-or-build the shared base PLT, copy its bytes
//!    to the project PLT path, then sync that copy from the base-required
//!    set to the project-required set.
//! 4. `succ_typings` enabled → whole-project success-typing pass over the
//!    project's own files, warnings always requested.
//!
//! Warning counts from every phase that ran are aggregated; a non-zero total
//! is reported as [`DialyzerError::Warnings`] after all phases complete.
//! Every fatal error short-circuits immediately; the run-scoped [`RunGuard`]
//! still fires on the way out.

use crate::error::DialyzerError;
use crate::metrics::RunMetrics;
use crate::models::{DialyzerConfig, FileSet};
use crate::services::backend::{AnalysisBackend, AnalysisPhase};
use crate::services::invoker::AnalysisInvoker;
use crate::services::manifest::ManifestResolver;
use crate::services::report::WarningReporter;
use crate::services::sync::sync;
use camino::Utf8Path;
use std::fs;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

/// Guaranteed end-of-run step.
///
/// Created at the top of [`PhaseOrchestrator::run`] and fired by `Drop`, so
/// the summary is emitted exactly once on every exit path, fatal or not.
struct RunGuard {
    metrics: Arc<RunMetrics>,
}

impl RunGuard {
    fn new(metrics: Arc<RunMetrics>) -> Self {
        Self { metrics }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.metrics.log_summary();
    }
}

/// Drives one full analysis run against a backend.
pub struct PhaseOrchestrator<'a, B> {
    backend: &'a B,
    config: &'a DialyzerConfig,
    resolver: ManifestResolver,
    metrics: Arc<RunMetrics>,
    console: Option<Box<dyn Write + Send>>,
}

impl<'a, B: AnalysisBackend> PhaseOrchestrator<'a, B> {
    pub fn new(backend: &'a B, config: &'a DialyzerConfig) -> Self {
        Self {
            backend,
            config,
            resolver: ManifestResolver::new(config.project.lib_dirs.clone()),
            metrics: Arc::new(RunMetrics::new()),
            console: None,
        }
    }

    /// Replace the default stdout console sink (used by tests).
    pub fn with_console(mut self, console: Box<dyn Write + Send>) -> Self {
        self.console = Some(console);
        self
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Execute the whole pipeline.
    ///
    /// `Ok(())` means the run completed with zero warnings. A completed run
    /// with diagnostics returns [`DialyzerError::Warnings`]; everything else
    /// is a fatal error from some phase.
    pub async fn run(&mut self) -> Result<(), DialyzerError> {
        let _guard = RunGuard::new(Arc::clone(&self.metrics));

        let version = self.backend.runtime_version().await?;
        tracing::info!("Backend runtime version {}", version);

        let output_path = self.config.output_path(&version);
        let mut reporter = match self.console.take() {
            Some(console) => WarningReporter::with_console(&output_path, console),
            None => WarningReporter::new(&output_path),
        };
        reporter.begin_run()?;

        let invoker = AnalysisInvoker::new(self.backend, &self.config.analysis);

        let plt_warnings = if self.config.analysis.update_plt {
            self.update_project_plt(&invoker, &mut reporter, &version)
                .await?
        } else {
            tracing::info!("PLT update disabled; leaving PLTs untouched");
            0
        };

        let succ_warnings = if self.config.analysis.succ_typings {
            self.succ_typings(&invoker, &mut reporter, &version).await?
        } else {
            tracing::info!("Success typing analysis disabled");
            0
        };

        let total = plt_warnings + succ_warnings;
        if total > 0 {
            tracing::warn!("{} warning(s) written to {}", total, output_path);
            return Err(DialyzerError::Warnings(total));
        }

        Ok(())
    }

    /// Bring the project PLT in line with the project-required file set,
    /// going through the base PLT when no project PLT exists yet.
    async fn update_project_plt(
        &self,
        invoker: &AnalysisInvoker<'_, B>,
        reporter: &mut WarningReporter,
        version: &str,
    ) -> Result<usize, DialyzerError> {
        let plt = self.config.plt_path(version);
        let required = self
            .resolver
            .resolve(&self.config.project_plt_apps(), &self.config.project.apps)?;

        match self.backend.plt_file_set(&plt).await? {
            Some(old) => {
                tracing::info!("Updating project PLT at {}", plt);
                sync(invoker, reporter, &self.metrics, &old, &required, &plt).await
            }
            None => {
                self.bootstrap_project_plt(invoker, reporter, version, &plt, &required)
                    .await
            }
        }
    }

    /// No project PLT yet: update-or-build the base PLT, copy it over, then
    /// sync the copy up to the project-required set. The freshly copied
    /// PLT's content is exactly the base-required set, so that pair is the
    /// old/new input of the final sync.
    async fn bootstrap_project_plt(
        &self,
        invoker: &AnalysisInvoker<'_, B>,
        reporter: &mut WarningReporter,
        version: &str,
        plt: &Utf8Path,
        required: &FileSet,
    ) -> Result<usize, DialyzerError> {
        let base_plt = self.config.base_plt_path(version);
        let base_required = self
            .resolver
            .resolve(&self.config.analysis.base_plt_apps, &self.config.project.apps)?;

        let base_warnings = match self.backend.plt_file_set(&base_plt).await? {
            Some(old) => {
                tracing::info!("Updating base PLT at {}", base_plt);
                sync(
                    invoker,
                    reporter,
                    &self.metrics,
                    &old,
                    &base_required,
                    &base_plt,
                )
                .await?
            }
            None => {
                tracing::info!("Building base PLT at {}", base_plt);
                self.build_plt(invoker, reporter, &base_plt, &base_required)
                    .await?
            }
        };

        copy_plt(&base_plt, plt)?;

        tracing::info!("Updating project PLT at {}", plt);
        let project_warnings = sync(
            invoker,
            reporter,
            &self.metrics,
            &base_required,
            required,
            plt,
        )
        .await?;

        Ok(base_warnings + project_warnings)
    }

    /// Single build phase over the full required set; no diff is computed.
    async fn build_plt(
        &self,
        invoker: &AnalysisInvoker<'_, B>,
        reporter: &mut WarningReporter,
        plt: &Utf8Path,
        required: &FileSet,
    ) -> Result<usize, DialyzerError> {
        if let Some(parent) = plt.parent() {
            fs::create_dir_all(parent).map_err(|e| DialyzerError::Backend {
                message: format!("failed to create PLT directory {parent}: {e}"),
            })?;
        }

        self.metrics.record_files_added(required.len());

        let start = Instant::now();
        let warnings = invoker.run(AnalysisPhase::Build, required, plt).await?;
        self.metrics.record_phase(start.elapsed());

        let count = reporter.report(&warnings)?;
        self.metrics.record_warnings(count);
        Ok(count)
    }

    /// Whole-project success-typing pass with the project PLT as background
    /// knowledge. Warnings are always requested here.
    async fn succ_typings(
        &self,
        invoker: &AnalysisInvoker<'_, B>,
        reporter: &mut WarningReporter,
        version: &str,
    ) -> Result<usize, DialyzerError> {
        let plt = self.config.plt_path(version);
        let files = self.resolver.project_files(&self.config.project.apps)?;

        if files.is_empty() {
            tracing::warn!("No project files to analyze");
            return Ok(0);
        }

        tracing::info!(
            "Running success typing analysis over {} file(s)",
            files.len()
        );

        let start = Instant::now();
        let warnings = invoker.run(AnalysisPhase::SuccTypings, &files, &plt).await?;
        self.metrics.record_phase(start.elapsed());

        let count = reporter.report(&warnings)?;
        self.metrics.record_warnings(count);
        Ok(count)
    }
}

/// Copy the base PLT's bytes to the project PLT path.
fn copy_plt(from: &Utf8Path, to: &Utf8Path) -> Result<(), DialyzerError> {
    let copy_error = |source: std::io::Error| DialyzerError::PltCopy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(copy_error)?;
    }
    fs::copy(from, to).map_err(copy_error)?;

    tracing::info!("Copied base PLT {} to {}", from, to);
    Ok(())
}
