//! Field vocabulary for policy matchers and transforms.
//!
//! A [`FieldRef`] addresses one location on a record: either a named scalar
//! field of the signal, or an attribute path rooted at the resource, the
//! instrumentation scope, or the record itself.

use serde::Deserialize;

/// Scalar fields addressable on a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogField {
    Body,
    SeverityText,
    TraceId,
    SpanId,
    EventName,
    ResourceSchemaUrl,
    ScopeSchemaUrl,
}

/// Scalar fields addressable on a metric datapoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricField {
    Name,
    Description,
    Unit,
    Type,
    AggregationTemporality,
    ScopeName,
    ScopeVersion,
    ResourceSchemaUrl,
    ScopeSchemaUrl,
}

/// Scalar fields addressable on a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceField {
    Name,
    TraceId,
    SpanId,
    ParentSpanId,
    TraceState,
    Kind,
    Status,
    EventName,
    ScopeName,
    ScopeVersion,
    ResourceSchemaUrl,
    ScopeSchemaUrl,
}

/// Which attribute map an attribute path is rooted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrScope {
    /// Resource-level attributes (service.name, etc.)
    Resource,
    /// Instrumentation scope attributes.
    Scope,
    /// Record-level attributes: log attributes, datapoint attributes,
    /// or span attributes depending on the signal.
    Record,
}

/// An attribute path rooted at one of the three attribute scopes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttrRef {
    pub scope: AttrScope,
    pub path: Vec<String>,
}

/// An addressable location on a record.
///
/// Deserializes from either a bare scalar field name (`"SEVERITY_TEXT"`) or
/// an attribute spec (`{"scope": "record", "path": ["user", "email"]}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FieldRef<F> {
    Field(F),
    Attr(AttrRef),
}

impl<F> FieldRef<F> {
    /// Convenience constructor for a record-scoped attribute path.
    pub fn record_attr<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Attr(AttrRef {
            scope: AttrScope::Record,
            path: path.into_iter().map(Into::into).collect(),
        })
    }

    /// Convenience constructor for a resource-scoped attribute path.
    pub fn resource_attr<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Attr(AttrRef {
            scope: AttrScope::Resource,
            path: path.into_iter().map(Into::into).collect(),
        })
    }

    /// Convenience constructor for a scope-scoped attribute path.
    pub fn scope_attr<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Attr(AttrRef {
            scope: AttrScope::Scope,
            path: path.into_iter().map(Into::into).collect(),
        })
    }
}
