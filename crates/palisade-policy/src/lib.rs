//! Palisade policy engine.
//!
//! Compiles declarative policies into an immutable, atomically-swappable
//! snapshot and evaluates individual telemetry records against it. The crate
//! is signal-shaped but model-agnostic: it knows about log records, metric
//! datapoints and spans as field vocabularies, not as concrete telemetry
//! types. A binding layer implements [`Record`] over its own representation
//! and gets matching, keep combination, sampling and ordered transform
//! application for free.
//!
//! # Evaluation
//!
//! For one record: collect the policies whose matcher conjunction holds,
//! merge their keep specs (the most restrictive wins), then either drop the
//! record untouched or apply every matching policy's transforms in id-sorted
//! order. Evaluation never fails; a malformed policy is rejected at compile
//! time and the previous snapshot stays active.

pub mod def;
pub mod engine;
pub mod error;
pub mod field;
pub mod keep;
pub mod matcher;
pub mod provider;
pub mod snapshot;

pub use def::{MatchExprDef, MatcherDef, PolicyDef, TargetDef, TargetSpec, TransformDef};
pub use engine::{evaluate, Disposition, Evaluation, Record, TransformStats};
pub use error::{CompileError, ProviderError};
pub use field::{AttrRef, AttrScope, FieldRef, LogField, MetricField, TraceField};
pub use keep::{sample_keeps, Keep, LogKeep, MetricKeep, TraceKeep, Verdict};
pub use matcher::{CompiledMatcher, MatchExpr};
pub use provider::{PolicyProvider, PolicyRegistry, RecompileCallback, StaticProvider};
pub use snapshot::{compile, CompiledPolicy, PolicySnapshot, TransformOp};
