use crate::error::DialyzerError;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};

/// Strip the degenerate "no source line" prefix from a formatted diagnostic.
///
/// File-scope diagnostics arrive as `":0: <message>"`; the empty position is
/// noise, so only the bare message is kept.
pub fn format_warning(raw: &str) -> &str {
    raw.trim_end()
        .strip_prefix(":0: ")
        .unwrap_or_else(|| raw.trim_end())
}

/// Surfaces formatted diagnostics on the console and in the warnings file.
///
/// The console sink sees every line as it is produced, so users get progress
/// even when a later phase fails fatally. The output file accumulates lines
/// across all phases of one run: [`begin_run`](Self::begin_run) truncates it
/// exactly once at run start, after which every non-empty batch is appended
/// through a short-lived handle (no descriptor is held across phases).
pub struct WarningReporter {
    output_path: Utf8PathBuf,
    console: Box<dyn Write + Send>,
}

impl WarningReporter {
    /// Reporter writing to the given output file and stdout.
    pub fn new<P: AsRef<Utf8Path>>(output_path: P) -> Self {
        Self::with_console(output_path, Box::new(io::stdout()))
    }

    /// Reporter with a caller-supplied console sink.
    pub fn with_console<P: AsRef<Utf8Path>>(
        output_path: P,
        console: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            output_path: output_path.as_ref().to_path_buf(),
            console,
        }
    }

    pub fn output_path(&self) -> &Utf8Path {
        &self.output_path
    }

    /// Create the output file fresh. Called exactly once, at run start;
    /// everything afterwards appends.
    pub fn begin_run(&mut self) -> Result<(), DialyzerError> {
        if let Some(parent) = self.output_path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.output_error(source))?;
        }
        File::create(&self.output_path).map_err(|source| self.output_error(source))?;
        tracing::debug!("Warnings file created at {}", self.output_path);
        Ok(())
    }

    /// Format and surface one batch of raw diagnostics, returning how many
    /// lines were produced.
    pub fn report(&mut self, raw_warnings: &[String]) -> Result<usize, DialyzerError> {
        let formatted: Vec<&str> = raw_warnings.iter().map(|w| format_warning(w)).collect();

        for line in &formatted {
            // Console output is best-effort; the file is the durable record.
            let _ = writeln!(self.console, "{line}");
        }
        let _ = self.console.flush();

        if !formatted.is_empty() {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.output_path)
                .map_err(|source| self.output_error(source))?;
            for line in &formatted {
                writeln!(file, "{line}").map_err(|source| self.output_error(source))?;
            }
        }

        Ok(formatted.len())
    }

    fn output_error(&self, source: io::Error) -> DialyzerError {
        DialyzerError::OutputFile {
            path: self.output_path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    fn reporter_in(temp: &TempDir) -> WarningReporter {
        let output = utf8(temp.path()).join("26.2.dialyzer_warnings");
        WarningReporter::with_console(output, Box::new(Vec::new()))
    }

    #[test]
    fn test_format_warning_strips_degenerate_prefix() {
        assert_eq!(
            format_warning(":0: Unknown function m:f/0"),
            "Unknown function m:f/0"
        );
        assert_eq!(
            format_warning("m.erl:7: Function f/0 has no local return"),
            "m.erl:7: Function f/0 has no local return"
        );
    }

    #[test]
    fn test_report_appends_across_batches() {
        let temp = TempDir::new().unwrap();
        let mut reporter = reporter_in(&temp);
        reporter.begin_run().unwrap();

        let first = reporter
            .report(&["m.erl:1: one".to_string(), ":0: two".to_string()])
            .unwrap();
        let second = reporter.report(&["m.erl:3: three".to_string()]).unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 1);

        let contents = fs::read_to_string(reporter.output_path()).unwrap();
        assert_eq!(contents, "m.erl:1: one\ntwo\nm.erl:3: three\n");
    }

    #[test]
    fn test_begin_run_truncates_previous_contents() {
        let temp = TempDir::new().unwrap();
        let mut reporter = reporter_in(&temp);

        reporter.begin_run().unwrap();
        reporter.report(&["m.erl:1: stale".to_string()]).unwrap();

        reporter.begin_run().unwrap();
        let contents = fs::read_to_string(reporter.output_path()).unwrap();
        assert!(contents.is_empty());
    }

    #[test]
    fn test_empty_batch_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let mut reporter = reporter_in(&temp);
        reporter.begin_run().unwrap();

        assert_eq!(reporter.report(&[]).unwrap(), 0);
        let contents = fs::read_to_string(reporter.output_path()).unwrap();
        assert!(contents.is_empty());
    }

    #[test]
    fn test_begin_run_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let output = utf8(temp.path()).join("nested/dir/26.2.dialyzer_warnings");
        let mut reporter = WarningReporter::with_console(&output, Box::new(Vec::new()));

        reporter.begin_run().unwrap();
        assert!(output.exists());
    }

    #[test]
    fn test_unwritable_output_is_an_output_file_error() {
        let mut reporter =
            WarningReporter::with_console("/proc/no_such_dir/w.txt", Box::new(Vec::new()));
        let err = reporter.begin_run().unwrap_err();
        assert!(matches!(err, DialyzerError::OutputFile { .. }));
    }
}
