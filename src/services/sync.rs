//! Incremental PLT synchronization.
//!
//! Given what a PLT currently contains and what it should contain, only the
//! delta is handed to the backend: stale entries are removed, retained
//! entries are re-checked (catching changed bytecode behind unchanged
//! paths), and missing entries are added. Remove runs before add so the
//! PLT's working set shrinks before it grows; check runs between them so
//! retained entries are validated before new ones are layered on. A
//! sub-phase with an empty partition is skipped outright: the backend is
//! never invoked with an empty file list.

use crate::error::DialyzerError;
use crate::metrics::RunMetrics;
use crate::models::{FileSet, SyncPartition};
use crate::services::backend::{AnalysisBackend, AnalysisPhase};
use crate::services::invoker::AnalysisInvoker;
use crate::services::report::WarningReporter;
use camino::Utf8Path;
use std::time::Instant;

/// Bring the PLT at `plt` from holding `old` to holding exactly `new`.
///
/// Returns the number of warnings surfaced across the sub-phases that ran.
pub async fn sync<B: AnalysisBackend>(
    invoker: &AnalysisInvoker<'_, B>,
    reporter: &mut WarningReporter,
    metrics: &RunMetrics,
    old: &FileSet,
    new: &FileSet,
    plt: &Utf8Path,
) -> Result<usize, DialyzerError> {
    let partition = SyncPartition::partition(old, new);

    if partition.is_empty() {
        tracing::info!("PLT {} is up to date", plt);
        return Ok(0);
    }

    tracing::info!(
        "Syncing PLT {}: {} to remove, {} to check, {} to add",
        plt,
        partition.remove.len(),
        partition.check.len(),
        partition.add.len()
    );

    metrics.record_files_removed(partition.remove.len());
    metrics.record_files_checked(partition.check.len());
    metrics.record_files_added(partition.add.len());

    let sub_phases = [
        (AnalysisPhase::Remove, &partition.remove),
        (AnalysisPhase::Check, &partition.check),
        (AnalysisPhase::Add, &partition.add),
    ];

    let mut total = 0;
    for (phase, files) in sub_phases {
        if files.is_empty() {
            tracing::debug!("Skipping {} phase: nothing to do", phase.name());
            continue;
        }

        let start = Instant::now();
        let warnings = invoker.run(phase, files, plt).await?;
        metrics.record_phase(start.elapsed());

        let count = reporter.report(&warnings)?;
        metrics.record_warnings(count);
        total += count;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisSettings;
    use crate::services::backend::AnalysisRequest;
    use camino::Utf8PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct RecordingBackend {
        requests: Mutex<Vec<AnalysisRequest>>,
    }

    impl RecordingBackend {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
            }
        }

        fn phases(&self) -> Vec<AnalysisPhase> {
            self.requests.lock().unwrap().iter().map(|r| r.phase).collect()
        }
    }

    impl AnalysisBackend for RecordingBackend {
        async fn runtime_version(&self) -> Result<String, DialyzerError> {
            Ok("26.2".to_string())
        }

        async fn plt_file_set(
            &self,
            _plt: &Utf8Path,
        ) -> Result<Option<FileSet>, DialyzerError> {
            Ok(None)
        }

        async fn run_analysis(
            &self,
            request: &AnalysisRequest,
        ) -> Result<Vec<String>, DialyzerError> {
            assert!(
                !request.files.is_empty(),
                "backend invoked with an empty file list"
            );
            self.requests.lock().unwrap().push(request.clone());
            Ok(Vec::new())
        }
    }

    fn files(paths: &[&str]) -> FileSet {
        paths.iter().copied().map(Utf8PathBuf::from).collect()
    }

    fn test_reporter(temp: &TempDir) -> WarningReporter {
        let out = Utf8PathBuf::from_path_buf(temp.path().join("w.txt")).unwrap();
        let mut reporter = WarningReporter::with_console(out, Box::new(Vec::new()));
        reporter.begin_run().unwrap();
        reporter
    }

    #[tokio::test]
    async fn test_sync_runs_remove_check_add_in_order() {
        let backend = RecordingBackend::new();
        let settings = AnalysisSettings::default();
        let invoker = AnalysisInvoker::new(&backend, &settings);
        let temp = TempDir::new().unwrap();
        let mut reporter = test_reporter(&temp);
        let metrics = RunMetrics::new();

        let old = files(&["/lib/a.beam", "/lib/b.beam"]);
        let new = files(&["/lib/b.beam", "/lib/c.beam"]);

        let count = sync(
            &invoker,
            &mut reporter,
            &metrics,
            &old,
            &new,
            Utf8Path::new("/plts/p"),
        )
        .await
        .unwrap();

        assert_eq!(count, 0);
        assert_eq!(
            backend.phases(),
            vec![
                AnalysisPhase::Remove,
                AnalysisPhase::Check,
                AnalysisPhase::Add
            ]
        );

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests[0].files, vec![Utf8PathBuf::from("/lib/a.beam")]);
        assert_eq!(requests[1].files, vec![Utf8PathBuf::from("/lib/b.beam")]);
        assert_eq!(requests[2].files, vec![Utf8PathBuf::from("/lib/c.beam")]);
    }

    #[tokio::test]
    async fn test_sync_identical_sets_only_checks() {
        let backend = RecordingBackend::new();
        let settings = AnalysisSettings::default();
        let invoker = AnalysisInvoker::new(&backend, &settings);
        let temp = TempDir::new().unwrap();
        let mut reporter = test_reporter(&temp);
        let metrics = RunMetrics::new();

        let set = files(&["/lib/a.beam"]);
        let count = sync(
            &invoker,
            &mut reporter,
            &metrics,
            &set,
            &set,
            Utf8Path::new("/plts/p"),
        )
        .await
        .unwrap();

        assert_eq!(count, 0);
        // Check still runs: the retained entry gets re-validated.
        assert_eq!(backend.phases(), vec![AnalysisPhase::Check]);
    }

    #[tokio::test]
    async fn test_sync_disjoint_sets_skips_check() {
        let backend = RecordingBackend::new();
        let settings = AnalysisSettings::default();
        let invoker = AnalysisInvoker::new(&backend, &settings);
        let temp = TempDir::new().unwrap();
        let mut reporter = test_reporter(&temp);
        let metrics = RunMetrics::new();

        let count = sync(
            &invoker,
            &mut reporter,
            &metrics,
            &files(&["/lib/a.beam"]),
            &files(&["/lib/b.beam"]),
            Utf8Path::new("/plts/p"),
        )
        .await
        .unwrap();

        assert_eq!(count, 0);
        assert_eq!(
            backend.phases(),
            vec![AnalysisPhase::Remove, AnalysisPhase::Add]
        );
    }

    #[tokio::test]
    async fn test_sync_empty_old_and_new_is_a_noop() {
        let backend = RecordingBackend::new();
        let settings = AnalysisSettings::default();
        let invoker = AnalysisInvoker::new(&backend, &settings);
        let temp = TempDir::new().unwrap();
        let mut reporter = test_reporter(&temp);
        let metrics = RunMetrics::new();

        let count = sync(
            &invoker,
            &mut reporter,
            &metrics,
            &FileSet::new(),
            &FileSet::new(),
            Utf8Path::new("/plts/p"),
        )
        .await
        .unwrap();

        assert_eq!(count, 0);
        assert!(backend.phases().is_empty());
    }
}
