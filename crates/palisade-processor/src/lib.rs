//! Palisade processor - inline policy filter/transformer for OTLP telemetry.
//!
//! Sits in a collector pipeline and evaluates every log record, metric
//! datapoint and span in a batch against the active policy snapshot:
//! matching policies may drop the record, keep it, probabilistically sample
//! it, or mutate its fields and attributes in place. Emptied scopes and
//! resources are pruned; surviving entries keep their order.
//!
//! ## Architecture
//!
//! ```text
//! policy file ──▶ FilePolicyProvider ──▶ PolicyRegistry ──▶ compiled snapshot
//!                                                                │ atomic swap
//! OTLP batch ──▶ PolicyProcessor::process_* ──▶ engine ──▶ mutated batch
//! ```
//!
//! The snapshot is loaded once per batch through a lock-free pointer, so a
//! batch always observes one consistent policy set; providers replace the
//! snapshot from their own tasks without blocking evaluation.

pub mod attrs;
pub mod coerce;
pub mod config;
pub mod context;
pub mod error;
pub mod process;
pub mod provider;
pub mod sampling;

pub use config::ProcessorConfig;
pub use context::{LogCtx, MetricCtx, MetricType, TraceCtx};
pub use error::ProcessorError;
pub use process::PolicyProcessor;
pub use provider::{start_processor, watch_policy_file, FilePolicyProvider, WatcherHandle};
