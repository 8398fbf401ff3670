use crate::error::DialyzerError;
use crate::models::{AnalysisSettings, FileSet};
use crate::services::backend::{AnalysisBackend, AnalysisPhase, AnalysisRequest};
use camino::Utf8Path;

/// Warning categories force-disabled when a phase did not request warnings.
///
/// Passing the full suppression set (rather than nothing) keeps a
/// PLT-maintenance call from surfacing diagnostics through whatever defaults
/// the backend ships with.
pub const NO_WARNINGS: &[&str] = &[
    "no_return",
    "no_unused",
    "no_improper_lists",
    "no_fun_app",
    "no_match",
    "no_opaque",
    "no_fail_call",
    "no_contracts",
    "no_behaviours",
    "no_undefined_callbacks",
    "no_underspecs",
    "no_unknown",
];

/// Normalizes one backend invocation per analysis mode.
///
/// Policy lives here, mechanics live in the backend: the invoker decides
/// which PLT paths a mode reads and writes, whether warnings are requested,
/// and which warning category flags go along; the backend just executes the
/// resulting request. The success-typing phase always requests warnings; the
/// PLT-maintenance phases request them only when `get_warnings` is set, and
/// otherwise have their output discarded so their count is zero no matter
/// what the backend prints.
pub struct AnalysisInvoker<'a, B> {
    backend: &'a B,
    settings: &'a AnalysisSettings,
}

impl<'a, B: AnalysisBackend> AnalysisInvoker<'a, B> {
    pub fn new(backend: &'a B, settings: &'a AnalysisSettings) -> Self {
        Self { backend, settings }
    }

    /// Whether diagnostics are wanted for this phase.
    pub fn wants_warnings(&self, phase: AnalysisPhase) -> bool {
        match phase {
            AnalysisPhase::SuccTypings => true,
            _ => self.settings.get_warnings,
        }
    }

    /// Assemble the normalized request for one phase.
    ///
    /// PLT plumbing per mode: `Build` writes a fresh PLT (output only);
    /// `Add`/`Remove`/`Check` rewrite an existing one (init and output);
    /// `SuccTypings` reads it as background knowledge (init only). The
    /// backend's own consistency pre-check is always disabled; the
    /// orchestrator has already queried the PLT's exact content.
    pub fn request_for(
        &self,
        phase: AnalysisPhase,
        files: &FileSet,
        plt: &Utf8Path,
    ) -> AnalysisRequest {
        let (init_plt, output_plt) = match phase {
            AnalysisPhase::Build => (None, Some(plt.to_path_buf())),
            AnalysisPhase::Add | AnalysisPhase::Remove | AnalysisPhase::Check => {
                (Some(plt.to_path_buf()), Some(plt.to_path_buf()))
            }
            AnalysisPhase::SuccTypings => (Some(plt.to_path_buf()), None),
        };

        let get_warnings = self.wants_warnings(phase);
        let warning_flags = if get_warnings {
            self.settings.warnings.clone()
        } else {
            NO_WARNINGS.iter().map(|s| s.to_string()).collect()
        };

        AnalysisRequest {
            phase,
            files: files.to_sorted_vec(),
            init_plt,
            output_plt,
            get_warnings,
            warning_flags,
            check_plt: false,
        }
    }

    /// Run one phase and return its raw warnings.
    ///
    /// Returns an empty list when the phase did not request warnings,
    /// regardless of backend output.
    pub async fn run(
        &self,
        phase: AnalysisPhase,
        files: &FileSet,
        plt: &Utf8Path,
    ) -> Result<Vec<String>, DialyzerError> {
        let request = self.request_for(phase, files, plt);
        let warnings = self.backend.run_analysis(&request).await?;

        if request.get_warnings {
            Ok(warnings)
        } else {
            if !warnings.is_empty() {
                tracing::debug!(
                    "Discarding {} unrequested warning(s) from {} phase",
                    warnings.len(),
                    phase.name()
                );
            }
            Ok(Vec::new())
        }
    }
}
