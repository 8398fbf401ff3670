use crate::error::DialyzerError;
use crate::models::FileSet;
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::time::Instant;
use tokio::process::Command;

/// One of the five analysis modes the backend understands.
///
/// The PLT-maintenance modes (`Build`, `Add`, `Remove`, `Check`) mutate the
/// PLT on disk; `SuccTypings` only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisPhase {
    Build,
    Add,
    Remove,
    Check,
    SuccTypings,
}

impl AnalysisPhase {
    /// Short name used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisPhase::Build => "build",
            AnalysisPhase::Add => "add",
            AnalysisPhase::Remove => "remove",
            AnalysisPhase::Check => "check",
            AnalysisPhase::SuccTypings => "succ_typings",
        }
    }

    /// True for modes that maintain the PLT rather than analyze the project.
    pub fn is_plt_maintenance(&self) -> bool {
        !matches!(self, AnalysisPhase::SuccTypings)
    }
}

/// A fully-normalized request for one backend invocation.
///
/// Assembled by [`AnalysisInvoker`](crate::services::AnalysisInvoker); the
/// backend maps it onto whatever its native interface is without further
/// policy decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub phase: AnalysisPhase,

    /// Compiled-object files participating in this phase, sorted.
    pub files: Vec<Utf8PathBuf>,

    /// PLT read as background knowledge (all modes except `Build`).
    pub init_plt: Option<Utf8PathBuf>,

    /// PLT written by this phase (all maintenance modes).
    pub output_plt: Option<Utf8PathBuf>,

    /// Whether diagnostics from this phase are wanted at all.
    pub get_warnings: bool,

    /// Warning category flags: the enabled categories when warnings are
    /// requested, the full suppression set otherwise.
    pub warning_flags: Vec<String>,

    /// Whether the backend may run its own PLT consistency pre-check. The
    /// invoker always sets this to false: the orchestrator already knows the
    /// PLT's content from the info query.
    pub check_plt: bool,
}

/// The opaque analysis capability this crate drives.
///
/// The production implementation shells out to the `dialyzer` escript; tests
/// substitute an in-memory fake. Implementations are the only code permitted
/// to mutate a PLT file.
pub trait AnalysisBackend {
    /// Version string of the underlying runtime/toolchain, used to key PLT
    /// and output file names.
    fn runtime_version(&self) -> impl Future<Output = Result<String, DialyzerError>> + Send;

    /// The set of files an existing PLT was built from, or `None` if no PLT
    /// exists at `plt`.
    fn plt_file_set(
        &self,
        plt: &Utf8Path,
    ) -> impl Future<Output = Result<Option<FileSet>, DialyzerError>> + Send;

    /// Run one analysis phase, returning the raw diagnostic lines it emitted.
    fn run_analysis(
        &self,
        request: &AnalysisRequest,
    ) -> impl Future<Output = Result<Vec<String>, DialyzerError>> + Send;
}

/// Backend implementation wrapping the Erlang `dialyzer` escript.
///
/// This service handles all aspects of driving the executable: command-line
/// construction for the five modes, subprocess execution, exit-status
/// classification, and extraction of diagnostic lines from the output.
///
/// # Fields
///
/// The service pre-compiles regex patterns at construction time:
///
/// - `warning_pattern`: Matches formatted diagnostic lines
///   - Pattern: `^\S*:\d+`
///   - Example match: "mymod.erl:142: Function init/1 has no local return"
///   - Also matches the degenerate "no source line" form ":0: ..." emitted
///     for file-scope diagnostics
///
/// - `version_pattern`: Extracts the version number from `--version` output
///   - Pattern: `v?(\d+(?:\.\d+)+)`
///   - Example match: "Dialyzer version v5.1.3"
///
/// # Exit status convention
///
/// `dialyzer` exits 0 for a clean run, 2 for a run that produced warnings,
/// and 1 for an error; both 0 and 2 are successful invocations here.
pub struct DialyzerBackend {
    /// Path of the dialyzer executable
    dialyzer_bin: Utf8PathBuf,

    /// Regex for recognizing diagnostic lines in backend output
    warning_pattern: Regex,

    /// Regex for extracting the version number from `--version` output
    version_pattern: Regex,
}

impl DialyzerBackend {
    /// Create a new DialyzerBackend with compiled regex patterns
    pub fn new<P: AsRef<Utf8Path>>(dialyzer_bin: P) -> Self {
        Self {
            dialyzer_bin: dialyzer_bin.as_ref().to_path_buf(),
            warning_pattern: Regex::new(r"^\S*:\d+").expect("Invalid warning regex"),
            version_pattern: Regex::new(r"v?(\d+(?:\.\d+)+)").expect("Invalid version regex"),
        }
    }

    /// Build the argument list for one analysis invocation
    ///
    /// Mode flags: `--build_plt`, `--add_to_plt`, `--remove_from_plt`,
    /// `--check_plt`; success typing is the executable's default mode and
    /// needs no flag. `--no_check_plt` is passed whenever an init PLT is in
    /// play and the request disabled the pre-check.
    pub fn build_analysis_args(&self, request: &AnalysisRequest) -> Vec<String> {
        let mut args: Vec<String> = vec!["--quiet".to_string()];

        let mode_flag = match request.phase {
            AnalysisPhase::Build => Some("--build_plt"),
            AnalysisPhase::Add => Some("--add_to_plt"),
            AnalysisPhase::Remove => Some("--remove_from_plt"),
            AnalysisPhase::Check => Some("--check_plt"),
            AnalysisPhase::SuccTypings => None,
        };
        if let Some(flag) = mode_flag {
            args.push(flag.to_string());
        }

        if let Some(init_plt) = &request.init_plt {
            args.push("--plt".to_string());
            args.push(init_plt.to_string());
            if !request.check_plt {
                args.push("--no_check_plt".to_string());
            }
        }

        if let Some(output_plt) = &request.output_plt {
            args.push("--output_plt".to_string());
            args.push(output_plt.to_string());
        }

        for category in &request.warning_flags {
            args.push(format!("-W{category}"));
        }

        for file in &request.files {
            args.push(file.to_string());
        }

        args
    }

    /// Extract diagnostic lines from backend output
    fn parse_warning_lines(&self, output: &str) -> Vec<String> {
        output
            .lines()
            .map(str::trim_end)
            .filter(|line| self.warning_pattern.is_match(line))
            .map(str::to_string)
            .collect()
    }

    /// Extract the PLT file set from `--plt_info` output
    ///
    /// The info listing prints one absolute `.beam` path per line after its
    /// header; anything else (headers, counts) is ignored.
    fn parse_plt_info_output(output: &str) -> FileSet {
        output
            .lines()
            .map(str::trim)
            .filter(|line| line.ends_with(".beam"))
            .map(Utf8PathBuf::from)
            .collect()
    }

    fn parse_version_output(&self, output: &str) -> Option<String> {
        self.version_pattern
            .captures(output)
            .map(|caps| caps[1].to_string())
    }

    async fn run_command(&self, args: &[String]) -> Result<std::process::Output, DialyzerError> {
        tracing::debug!("Executing: {} {}", self.dialyzer_bin, args.join(" "));

        let start = Instant::now();
        let output = Command::new(self.dialyzer_bin.as_std_path())
            .args(args)
            .output()
            .await
            .map_err(|e| DialyzerError::Backend {
                message: format!("failed to spawn {}: {}", self.dialyzer_bin, e),
            })?;

        tracing::debug!(
            "Backend completed in {:.2}s with status {:?}",
            start.elapsed().as_secs_f32(),
            output.status.code()
        );

        Ok(output)
    }
}

/// True when the combined output indicates a PLT that exists but cannot be
/// used, as opposed to one that is simply absent.
fn is_plt_read_failure(text: &str) -> bool {
    text.contains("Could not read the PLT")
        || text.contains("not a PLT file")
        || text.contains("old PLT")
}

fn is_plt_missing(text: &str) -> bool {
    text.contains("Could not find the PLT") || text.contains("No such file")
}

impl AnalysisBackend for DialyzerBackend {
    async fn runtime_version(&self) -> Result<String, DialyzerError> {
        let output = self.run_command(&["--version".to_string()]).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        self.parse_version_output(&stdout)
            .ok_or_else(|| DialyzerError::Backend {
                message: format!("could not parse backend version from {stdout:?}"),
            })
    }

    async fn plt_file_set(&self, plt: &Utf8Path) -> Result<Option<FileSet>, DialyzerError> {
        if !plt.exists() {
            return Ok(None);
        }

        let args = vec![
            "--plt_info".to_string(),
            "--plt".to_string(),
            plt.to_string(),
        ];
        let output = self.run_command(&args).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            return Ok(Some(Self::parse_plt_info_output(&stdout)));
        }

        let combined = format!("{stdout}\n{stderr}");
        if is_plt_missing(&combined) {
            Ok(None)
        } else if is_plt_read_failure(&combined) {
            Err(DialyzerError::PltRead {
                path: plt.to_path_buf(),
                message: combined.trim().to_string(),
            })
        } else {
            Err(DialyzerError::Backend {
                message: format!("plt_info failed for {plt}: {}", combined.trim()),
            })
        }
    }

    async fn run_analysis(&self, request: &AnalysisRequest) -> Result<Vec<String>, DialyzerError> {
        let args = self.build_analysis_args(request);

        tracing::info!(
            "Running {} phase over {} file(s)",
            request.phase.name(),
            request.files.len()
        );

        let output = self.run_command(&args).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        // 0 = clean, 2 = completed with warnings; anything else is an error.
        match output.status.code() {
            Some(0) | Some(2) => Ok(self.parse_warning_lines(&stdout)),
            code => {
                let combined = format!("{stdout}\n{stderr}");
                let plt = request.init_plt.as_ref().or(request.output_plt.as_ref());
                if let Some(plt) = plt
                    && is_plt_read_failure(&combined)
                {
                    return Err(DialyzerError::PltRead {
                        path: plt.clone(),
                        message: combined.trim().to_string(),
                    });
                }
                Err(DialyzerError::Backend {
                    message: format!(
                        "{} phase exited with status {:?}: {}",
                        request.phase.name(),
                        code,
                        combined.trim()
                    ),
                })
            }
        }
    }
}
