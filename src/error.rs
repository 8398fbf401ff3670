//! Error taxonomy for the analysis pipeline.
//!
//! Every core component returns `Result<_, DialyzerError>` explicitly; `anyhow`
//! is reserved for the application boundary (`main`, configuration loading).
//! All variants except [`DialyzerError::Warnings`] are fatal: they abort the
//! remainder of the pipeline immediately and are never retried, since PLT
//! mutation is not assumed safe to replay blindly.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while maintaining PLTs and running the analysis.
#[derive(Debug, Error)]
pub enum DialyzerError {
    /// An application named in the configuration could not be located in any
    /// library directory and is not one of the project's own applications.
    #[error("unknown application: {0}")]
    UnknownApplication(String),

    /// A PLT file exists on disk but the backend could not read it.
    #[error("could not read the PLT at {path}: {message}")]
    PltRead { path: Utf8PathBuf, message: String },

    /// Copying the base PLT to the project PLT path failed.
    #[error("failed to copy PLT from {from} to {to}: {source}")]
    PltCopy {
        from: Utf8PathBuf,
        to: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The warnings output file could not be created or appended to.
    #[error("failed to write warnings file {path}: {source}")]
    OutputFile {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The analysis backend could not be spawned or reported an
    /// unclassified failure.
    #[error("analysis backend error: {message}")]
    Backend { message: String },

    /// The run completed but the analysis produced warnings. Reported only
    /// after all phases finish; never short-circuits earlier phases.
    #[error("dialyzer found {0} warning(s)")]
    Warnings(usize),
}

impl DialyzerError {
    /// True for the "success with caveats" outcome: the pipeline ran to
    /// completion and only diagnostics remain.
    pub fn is_warnings(&self) -> bool {
        matches!(self, DialyzerError::Warnings(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_application_surfaces_name_verbatim() {
        let err = DialyzerError::UnknownApplication("missing_app".to_string());
        assert_eq!(err.to_string(), "unknown application: missing_app");
    }

    #[test]
    fn test_warnings_is_not_a_crash() {
        assert!(DialyzerError::Warnings(3).is_warnings());
        assert!(
            !DialyzerError::Backend {
                message: "boom".to_string()
            }
            .is_warnings()
        );
    }
}
