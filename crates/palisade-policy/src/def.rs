//! Declarative policy definitions.
//!
//! This is the wire model consumed by [`compile`](crate::snapshot::compile):
//! a policy names one signal target carrying matchers, a keep spec, and an
//! optional transform bundle. The reference encoding is compact JSON with an
//! externally-tagged target (`log`/`metric`/`trace`) and tagged-union matcher
//! expressions (`exact`/`contains`/`starts_with`/`regex`/`exists`).

use serde::Deserialize;

use crate::field::{FieldRef, LogField, MetricField, TraceField};
use crate::keep::{LogKeep, TraceKeep};

/// A single policy definition.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyDef {
    /// Stable identifier; evaluation order is ascending byte order of ids.
    pub id: String,
    /// Human-readable name, used only for logging.
    pub name: String,
    /// Disabled policies are excluded from the compiled snapshot.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(flatten)]
    pub target: TargetDef,
}

const fn default_enabled() -> bool {
    true
}

/// The signal a policy applies to, with its matchers, keep spec and
/// transforms.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetDef {
    Log(TargetSpec<LogField, LogKeep>),
    Metric(TargetSpec<MetricField, bool>),
    Trace(TargetSpec<TraceField, TraceKeep>),
}

/// The body of a target: matcher conjunction, keep spec, optional transform.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "F: Deserialize<'de>, K: Deserialize<'de>"))]
pub struct TargetSpec<F, K> {
    /// All matchers must hold for the policy to apply.
    #[serde(rename = "match", default = "Vec::new")]
    pub matchers: Vec<MatcherDef<F>>,
    pub keep: K,
    #[serde(default)]
    pub transform: Option<TransformDef<F>>,
}

/// A `(field, expression)` pair.
#[derive(Debug, Clone, Deserialize)]
pub struct MatcherDef<F> {
    pub field: FieldRef<F>,
    #[serde(flatten)]
    pub expr: MatchExprDef,
}

/// A match expression over the extracted byte value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchExprDef {
    /// Byte-exact equality.
    Exact(String),
    /// Substring containment.
    Contains(String),
    /// Prefix match.
    StartsWith(String),
    /// Unanchored regular expression.
    Regex(String),
    /// `true` matches present values, `false` matches absent ones.
    Exists(bool),
}

/// Ordered transform lists; applied remove, then redact, then rename, then
/// add, each list in declared order.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransformDef<F> {
    pub remove: Vec<RemoveDef<F>>,
    pub redact: Vec<RedactDef<F>>,
    pub rename: Vec<RenameDef<F>>,
    pub add: Vec<AddDef<F>>,
}

// Derived Default would demand `F: Default` for no reason.
impl<F> Default for TransformDef<F> {
    fn default() -> Self {
        Self {
            remove: Vec::new(),
            redact: Vec::new(),
            rename: Vec::new(),
            add: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveDef<F> {
    pub field: FieldRef<F>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedactDef<F> {
    pub field: FieldRef<F>,
    /// Replacement value (default: `"[REDACTED]"`).
    #[serde(default = "default_replacement")]
    pub value: String,
}

fn default_replacement() -> String {
    "[REDACTED]".to_owned()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenameDef<F> {
    /// Source location; attribute refs only, scalar fields are a miss.
    pub field: FieldRef<F>,
    /// Target key at the root of the source's attribute map.
    pub to: String,
    /// Overwrite an existing target key when set.
    #[serde(default)]
    pub upsert: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddDef<F> {
    pub field: FieldRef<F>,
    pub value: String,
    /// Overwrite an existing value when set.
    #[serde(default)]
    pub upsert: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::AttrScope;

    #[test]
    fn deserialize_log_drop_policy() {
        let json = r#"{
            "id": "drop-debug",
            "name": "Drop debug logs",
            "enabled": true,
            "log": {
                "match": [{"field": "SEVERITY_TEXT", "exact": "DEBUG"}],
                "keep": "none"
            }
        }"#;

        let def: PolicyDef = serde_json::from_str(json).unwrap();
        assert_eq!(def.id, "drop-debug");
        assert!(def.enabled);

        let TargetDef::Log(target) = &def.target else {
            panic!("expected log target");
        };
        assert_eq!(target.matchers.len(), 1);
        assert_eq!(target.keep, LogKeep::None);
        assert!(matches!(
            target.matchers[0].expr,
            MatchExprDef::Exact(ref s) if s == "DEBUG"
        ));
    }

    #[test]
    fn deserialize_metric_keep_bool() {
        let json = r#"{
            "id": "drop-noisy",
            "name": "Drop noisy datapoints",
            "metric": {
                "match": [{"field": {"scope": "record", "path": ["http.method"]}, "exact": "OPTIONS"}],
                "keep": false
            }
        }"#;

        let def: PolicyDef = serde_json::from_str(json).unwrap();
        let TargetDef::Metric(target) = &def.target else {
            panic!("expected metric target");
        };
        assert!(!target.keep);
        let FieldRef::Attr(attr) = &target.matchers[0].field else {
            panic!("expected attribute ref");
        };
        assert_eq!(attr.scope, AttrScope::Record);
        assert_eq!(attr.path, vec!["http.method"]);
    }

    #[test]
    fn deserialize_trace_sampling_and_transform() {
        let json = r#"{
            "id": "sample-health",
            "name": "Sample health checks",
            "trace": {
                "match": [
                    {"field": "NAME", "starts_with": "GET /health"},
                    {"field": "STATUS", "exists": false}
                ],
                "keep": {"percentage": 10},
                "transform": {
                    "redact": [{"field": {"scope": "record", "path": ["user", "email"]}}],
                    "add": [{"field": {"scope": "record", "path": ["sampled"]}, "value": "true", "upsert": true}]
                }
            }
        }"#;

        let def: PolicyDef = serde_json::from_str(json).unwrap();
        let TargetDef::Trace(target) = &def.target else {
            panic!("expected trace target");
        };
        assert!((target.keep.percentage - 10.0).abs() < f64::EPSILON);

        let transform = target.transform.as_ref().unwrap();
        assert!(transform.remove.is_empty());
        assert_eq!(transform.redact[0].value, "[REDACTED]");
        assert!(transform.add[0].upsert);
    }

    #[test]
    fn enabled_defaults_to_true() {
        let json = r#"{"id": "p", "name": "p", "log": {"keep": "all"}}"#;
        let def: PolicyDef = serde_json::from_str(json).unwrap();
        assert!(def.enabled);
    }
}
