//! Per-record evaluation.
//!
//! One generic algorithm, instantiated per signal through the [`Record`]
//! trait and a [`Keep`] combiner: collect the policies whose matcher
//! conjunction holds, merge their keep specs (restrictive wins), and, only
//! if the record survives, apply every matching policy's transforms in
//! id-sorted order. Evaluation is total: there is no error path on the hot
//! path, only dispositions.

use crate::field::{AttrScope, FieldRef};
use crate::keep::{sample_keeps, Keep, Verdict};
use crate::snapshot::{CompiledPolicy, TransformOp};

/// The outcome of evaluating one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Disposition {
    /// No policy matched; the record is kept by default.
    NoMatch,
    /// Matched and kept.
    Keep,
    /// Matched and dropped. The record must be removed unmodified.
    Drop,
    /// Matched and kept via probabilistic sampling at this percentage.
    Sample(f64),
}

impl Disposition {
    /// Whether the record stays in the batch.
    pub fn retains(self) -> bool {
        !matches!(self, Self::Drop)
    }
}

/// Transform hit/miss tallies for one evaluation. Observational only: a miss
/// never fails the evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Ops whose target pre-existed.
    pub hits: u64,
    /// Ops whose target was absent.
    pub misses: u64,
}

impl TransformStats {
    fn record(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }
}

/// The result of evaluating one record: its disposition plus transform
/// tallies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub disposition: Disposition,
    pub transforms: TransformStats,
}

/// A record context bound to one signal's field vocabulary.
///
/// Implementations bridge the engine to the backing telemetry model: they
/// extract matchable byte values and apply transform ops in place.
pub trait Record {
    type Field: Copy;

    /// Extract a scalar field as bytes; `None` means absent.
    fn field_value(&self, field: Self::Field) -> Option<Vec<u8>>;

    /// Extract a nested attribute as bytes; `None` means absent.
    fn attribute_value(&self, scope: AttrScope, path: &[String]) -> Option<Vec<u8>>;

    /// Apply one transform op. Returns `true` when the target pre-existed
    /// (a hit). Must never fail: unsupported targets are misses.
    fn apply(&mut self, op: &TransformOp<Self::Field>) -> bool;

    /// 63-bit randomness value used for probabilistic sampling decisions.
    /// Signals without a sampling identity return zero and survive any
    /// non-zero percentage.
    fn sampling_randomness(&self) -> u64 {
        0
    }
}

/// Extract the value a field ref addresses.
pub fn extract<R: Record>(record: &R, field: &FieldRef<R::Field>) -> Option<Vec<u8>> {
    match field {
        FieldRef::Field(f) => record.field_value(*f),
        FieldRef::Attr(attr) => record.attribute_value(attr.scope, &attr.path),
    }
}

impl<F: Copy, K> CompiledPolicy<F, K> {
    /// Whether every matcher holds against the record. A policy with no
    /// matchers matches everything.
    pub fn matches<R: Record<Field = F>>(&self, record: &R) -> bool {
        self.matchers
            .iter()
            .all(|m| m.expr.matches(extract(record, &m.field).as_deref()))
    }
}

/// Evaluate one record against a signal's id-sorted policy list.
pub fn evaluate<R, K>(policies: &[CompiledPolicy<R::Field, K>], record: &mut R) -> Evaluation
where
    R: Record,
    K: Keep,
{
    let mut matched: Vec<&CompiledPolicy<R::Field, K>> = Vec::new();
    let mut keep: Option<K> = None;

    for policy in policies {
        if policy.matches(record) {
            keep = Some(match keep {
                None => policy.keep,
                Some(merged) => merged.merge(policy.keep),
            });
            matched.push(policy);
        }
    }

    let Some(keep) = keep else {
        return Evaluation {
            disposition: Disposition::NoMatch,
            transforms: TransformStats::default(),
        };
    };

    let disposition = match keep.verdict() {
        Verdict::Drop => Disposition::Drop,
        Verdict::Keep => Disposition::Keep,
        Verdict::Sample(percentage) => {
            if sample_keeps(percentage, record.sampling_randomness()) {
                Disposition::Sample(percentage)
            } else {
                Disposition::Drop
            }
        }
    };

    // Dropped records must leave the engine byte-identical to how they
    // entered it.
    let mut transforms = TransformStats::default();
    if disposition.retains() {
        for policy in &matched {
            for op in &policy.transforms {
                transforms.record(record.apply(op));
            }
        }
    }

    Evaluation {
        disposition,
        transforms,
    }
}
