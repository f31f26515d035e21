//! Keep specs and their combination across matching policies.
//!
//! When several policies match one record, their keep specs are merged into a
//! single decision: the most restrictive policy always wins, so adding a
//! policy can never raise retention.

use serde::Deserialize;

/// What the merged keep spec says should happen to the record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Keep,
    Drop,
    /// Probabilistic retention at the given percentage (exclusive 0..100).
    Sample(f64),
}

/// A per-signal keep spec that can be merged with other matching policies'.
pub trait Keep: Copy {
    /// Combine with another matching policy's spec; restrictive wins.
    #[must_use]
    fn merge(self, other: Self) -> Self;

    /// Resolve the merged spec into a verdict.
    fn verdict(self) -> Verdict;
}

/// Log keep spec: `"all"` keeps matched records, `"none"` drops them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKeep {
    All,
    None,
}

impl Keep for LogKeep {
    fn merge(self, other: Self) -> Self {
        if self == Self::None || other == Self::None {
            Self::None
        } else {
            Self::All
        }
    }

    fn verdict(self) -> Verdict {
        match self {
            Self::All => Verdict::Keep,
            Self::None => Verdict::Drop,
        }
    }
}

/// Metric keep spec: `true` keeps matched datapoints, `false` drops them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricKeep(pub bool);

impl Keep for MetricKeep {
    fn merge(self, other: Self) -> Self {
        Self(self.0 && other.0)
    }

    fn verdict(self) -> Verdict {
        if self.0 {
            Verdict::Keep
        } else {
            Verdict::Drop
        }
    }
}

/// Trace keep spec: a sampling percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TraceKeep {
    pub percentage: f64,
}

impl Keep for TraceKeep {
    fn merge(self, other: Self) -> Self {
        Self {
            percentage: self.percentage.min(other.percentage),
        }
    }

    fn verdict(self) -> Verdict {
        if self.percentage <= 0.0 {
            Verdict::Drop
        } else if self.percentage >= 100.0 {
            Verdict::Keep
        } else {
            Verdict::Sample(self.percentage)
        }
    }
}

/// Decide whether a record survives sampling at `percentage`.
///
/// `randomness` is the record's 63-bit randomness value (for spans, the low
/// eight bytes of the trace ID, big-endian, shifted right one bit); records
/// with identical randomness always sample identically, so a span and its
/// logs make the same call.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn sample_keeps(percentage: f64, randomness: u64) -> bool {
    if percentage >= 100.0 {
        return true;
    }
    let threshold = ((percentage.max(0.0) / 100.0) * (1u64 << 63) as f64) as u64;
    randomness < threshold
}
