//! Compiled policy snapshots.
//!
//! A snapshot is the immutable compiled form of a full policy set: three
//! per-signal buckets, each sorted by policy id so evaluation order (and
//! therefore observable attribute insertion order) is deterministic.
//! Snapshots are built once and shared behind an `Arc`; replacement is a
//! single atomic pointer store by whoever holds the active pointer.

use crate::def::{MatchExprDef, PolicyDef, TargetDef, TargetSpec, TransformDef};
use crate::error::CompileError;
use crate::field::{FieldRef, LogField, MetricField, TraceField};
use crate::keep::{Keep, LogKeep, MetricKeep, TraceKeep};
use crate::matcher::{CompiledMatcher, MatchExpr};

/// A single transform operation, bound to a field ref.
#[derive(Debug, Clone)]
pub enum TransformOp<F> {
    Remove {
        field: FieldRef<F>,
    },
    Redact {
        field: FieldRef<F>,
        value: String,
    },
    Rename {
        field: FieldRef<F>,
        to: String,
        upsert: bool,
    },
    Add {
        field: FieldRef<F>,
        value: String,
        upsert: bool,
    },
}

/// One compiled policy: matchers, keep spec, and flattened transform ops in
/// application order (remove, redact, rename, add).
#[derive(Debug)]
pub struct CompiledPolicy<F, K> {
    pub id: String,
    pub name: String,
    pub matchers: Vec<CompiledMatcher<F>>,
    pub keep: K,
    pub transforms: Vec<TransformOp<F>>,
}

/// The immutable compiled form of a policy set.
#[derive(Debug, Default)]
pub struct PolicySnapshot {
    pub logs: Vec<CompiledPolicy<LogField, LogKeep>>,
    pub metrics: Vec<CompiledPolicy<MetricField, MetricKeep>>,
    pub traces: Vec<CompiledPolicy<TraceField, TraceKeep>>,
}

impl PolicySnapshot {
    /// Total number of enabled policies across all signals.
    pub fn len(&self) -> usize {
        self.logs.len() + self.metrics.len() + self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compile a policy set into a snapshot.
///
/// Disabled policies are skipped. Any invalid regex or keep spec rejects the
/// whole set; the caller keeps its previous snapshot.
pub fn compile(defs: &[PolicyDef]) -> Result<PolicySnapshot, CompileError> {
    let mut snapshot = PolicySnapshot::default();

    for def in defs {
        if !def.enabled {
            tracing::debug!(policy_id = %def.id, "skipping disabled policy");
            continue;
        }

        match &def.target {
            TargetDef::Log(spec) => {
                snapshot.logs.push(compile_policy(def, spec, spec.keep)?);
            }
            TargetDef::Metric(spec) => {
                snapshot
                    .metrics
                    .push(compile_policy(def, spec, MetricKeep(spec.keep))?);
            }
            TargetDef::Trace(spec) => {
                let keep = spec.keep;
                if !(0.0..=100.0).contains(&keep.percentage) {
                    return Err(CompileError::InvalidPercentage {
                        policy_id: def.id.clone(),
                        percentage: keep.percentage,
                    });
                }
                snapshot.traces.push(compile_policy(def, spec, keep)?);
            }
        }
    }

    snapshot.logs.sort_by(|a, b| a.id.cmp(&b.id));
    snapshot.metrics.sort_by(|a, b| a.id.cmp(&b.id));
    snapshot.traces.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(snapshot)
}

fn compile_policy<F: Clone, KD, K: Keep>(
    def: &PolicyDef,
    spec: &TargetSpec<F, KD>,
    keep: K,
) -> Result<CompiledPolicy<F, K>, CompileError> {
    let mut matchers = Vec::with_capacity(spec.matchers.len());
    for matcher in &spec.matchers {
        let expr = MatchExpr::compile(&matcher.expr).map_err(|source| CompileError::Regex {
            policy_id: def.id.clone(),
            pattern: match &matcher.expr {
                MatchExprDef::Regex(p) => p.clone(),
                _ => String::new(),
            },
            source,
        })?;
        matchers.push(CompiledMatcher {
            field: matcher.field.clone(),
            expr,
        });
    }

    Ok(CompiledPolicy {
        id: def.id.clone(),
        name: def.name.clone(),
        matchers,
        keep,
        transforms: flatten_transforms(spec.transform.as_ref()),
    })
}

fn flatten_transforms<F: Clone>(transform: Option<&TransformDef<F>>) -> Vec<TransformOp<F>> {
    let Some(transform) = transform else {
        return Vec::new();
    };

    let mut ops = Vec::with_capacity(
        transform.remove.len()
            + transform.redact.len()
            + transform.rename.len()
            + transform.add.len(),
    );
    for op in &transform.remove {
        ops.push(TransformOp::Remove {
            field: op.field.clone(),
        });
    }
    for op in &transform.redact {
        ops.push(TransformOp::Redact {
            field: op.field.clone(),
            value: op.value.clone(),
        });
    }
    for op in &transform.rename {
        ops.push(TransformOp::Rename {
            field: op.field.clone(),
            to: op.to.clone(),
            upsert: op.upsert,
        });
    }
    for op in &transform.add {
        ops.push(TransformOp::Add {
            field: op.field.clone(),
            value: op.value.clone(),
            upsert: op.upsert,
        });
    }
    ops
}
