// Run metrics module
//
// Lightweight accounting for one analysis run, emitted as a summary when the
// run ends (on every exit path, fatal or not).

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters for a single analysis run
///
/// Uses atomic operations so the metrics handle can be shared freely without
/// locks. Warning counts recorded here mirror the authoritative per-phase
/// counts the orchestrator aggregates; the metrics exist for observability,
/// not control flow.
#[derive(Debug)]
pub struct RunMetrics {
    /// Number of backend invocations actually performed
    pub phases_invoked: AtomicUsize,

    /// Total warnings reported across all phases
    pub warnings_reported: AtomicUsize,

    /// Files removed from PLTs across all sync phases
    pub files_removed: AtomicUsize,

    /// Files re-checked in PLTs across all sync phases
    pub files_checked: AtomicUsize,

    /// Files added to PLTs across all sync phases (build counts as add)
    pub files_added: AtomicUsize,

    /// Cumulative wall-clock time spent inside the backend, in milliseconds
    pub backend_time_ms: AtomicU64,

    /// Run start time
    start_time: Instant,
}

impl RunMetrics {
    /// Create a new RunMetrics instance with the clock started
    pub fn new() -> Self {
        Self {
            phases_invoked: AtomicUsize::new(0),
            warnings_reported: AtomicUsize::new(0),
            files_removed: AtomicUsize::new(0),
            files_checked: AtomicUsize::new(0),
            files_added: AtomicUsize::new(0),
            backend_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record one backend invocation and the time it took
    pub fn record_phase(&self, duration: Duration) {
        self.phases_invoked.fetch_add(1, Ordering::Relaxed);
        self.backend_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Record warnings surfaced by one phase
    pub fn record_warnings(&self, count: usize) {
        self.warnings_reported.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_files_removed(&self, count: usize) {
        self.files_removed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_files_checked(&self, count: usize) {
        self.files_checked.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_files_added(&self, count: usize) {
        self.files_added.fetch_add(count, Ordering::Relaxed);
    }

    /// Get elapsed time since the run started
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log a run summary
    pub fn log_summary(&self) {
        tracing::info!(
            "Run finished in {:.2}s ({} backend invocation(s), {:.2}s inside the backend)",
            self.elapsed().as_secs_f64(),
            self.phases_invoked.load(Ordering::Relaxed),
            self.backend_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
        );
        tracing::info!(
            "PLT delta: {} removed, {} checked, {} added; {} warning(s) reported",
            self.files_removed.load(Ordering::Relaxed),
            self.files_checked.load(Ordering::Relaxed),
            self.files_added.load(Ordering::Relaxed),
            self.warnings_reported.load(Ordering::Relaxed)
        );
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}
