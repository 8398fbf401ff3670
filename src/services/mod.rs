//! Services module - the analysis pipeline's business logic.
//!
//! Everything here is framework-agnostic: services take explicit parameters,
//! return explicit `Result`s, and have no knowledge of the binary entry
//! point, so each one is testable in isolation.
//!
//! # Components
//!
//! - [`AnalysisBackend`] / [`DialyzerBackend`]: The opaque analysis
//!   capability. The production implementation drives the `dialyzer`
//!   escript as a subprocess: command construction for the five modes,
//!   execution, exit-status classification, and regex extraction of
//!   diagnostic lines.
//! - [`ManifestResolver`]: Logical application names → installed artifact
//!   directories → compiled-object file sets, skipping applications the
//!   project provides itself.
//! - [`AnalysisInvoker`]: Per-mode option normalization (PLT in/out
//!   plumbing, warning gating, the `NO_WARNINGS` suppression set).
//! - [`sync`]: The incremental remove/check/add synchronization of a PLT
//!   against its required file set.
//! - [`WarningReporter`]: Diagnostic formatting, console echo, and the
//!   append-only warnings file.
//! - [`PhaseOrchestrator`]: The per-run state machine tying it all
//!   together and aggregating warning counts.
//!
//! # Backend Integration
//!
//! The orchestrator, engine, and invoker are generic over
//! [`AnalysisBackend`], so integration tests substitute an in-memory fake
//! and assert on the exact request sequence instead of spawning processes.

pub mod backend;
pub mod invoker;
pub mod manifest;
pub mod orchestrator;
pub mod report;
pub mod sync;

pub use backend::{AnalysisBackend, AnalysisPhase, AnalysisRequest, DialyzerBackend};
pub use invoker::{AnalysisInvoker, NO_WARNINGS};
pub use manifest::{ApplicationManifest, ManifestResolver};
pub use orchestrator::PhaseOrchestrator;
pub use report::{WarningReporter, format_warning};
pub use sync::sync;
