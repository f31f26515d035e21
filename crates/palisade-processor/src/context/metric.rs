//! Metric datapoint context.
//!
//! Policies evaluate individual datapoints, but several matchable fields
//! (name, type, temporality) live on the enclosing metric, so the context
//! borrows the metric's scalar fields alongside the datapoint's attribute
//! map. Scalar transforms on name/description/unit affect the whole metric,
//! which is exactly what the field addresses.

use opentelemetry_proto::tonic::common::v1::{InstrumentationScope, KeyValue};
use opentelemetry_proto::tonic::metrics::v1::AggregationTemporality;
use opentelemetry_proto::tonic::resource::v1::Resource;
use palisade_policy::{AttrScope, FieldRef, MetricField, Record, TransformOp};

use super::{
    add_string, attr_add, attr_redact, attr_remove, attr_rename, non_empty, redact_string,
    remove_string, AttrAccess,
};
use crate::attrs;

/// The five OTLP metric data shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Gauge,
    Sum,
    Histogram,
    ExponentialHistogram,
    Summary,
}

impl MetricType {
    /// The lowercase word used for matching.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gauge => "gauge",
            Self::Sum => "sum",
            Self::Histogram => "histogram",
            Self::ExponentialHistogram => "exponential_histogram",
            Self::Summary => "summary",
        }
    }
}

/// Everything needed to evaluate one metric datapoint.
pub struct MetricCtx<'a> {
    pub name: &'a mut String,
    pub description: &'a mut String,
    pub unit: &'a mut String,
    pub metric_type: MetricType,
    pub temporality: AggregationTemporality,
    /// The datapoint's own attribute map.
    pub attributes: &'a mut Vec<KeyValue>,
    pub resource: &'a mut Option<Resource>,
    pub scope: &'a mut Option<InstrumentationScope>,
    pub resource_schema_url: &'a str,
    pub scope_schema_url: &'a str,
}

impl AttrAccess for MetricCtx<'_> {
    fn attrs(&self, scope: AttrScope) -> Option<&[KeyValue]> {
        match scope {
            AttrScope::Resource => self.resource.as_ref().map(|r| r.attributes.as_slice()),
            AttrScope::Scope => self.scope.as_ref().map(|s| s.attributes.as_slice()),
            AttrScope::Record => Some(self.attributes),
        }
    }

    fn attrs_mut(&mut self, scope: AttrScope) -> &mut Vec<KeyValue> {
        match scope {
            AttrScope::Resource => &mut self.resource.get_or_insert_with(Default::default).attributes,
            AttrScope::Scope => &mut self.scope.get_or_insert_with(Default::default).attributes,
            AttrScope::Record => self.attributes,
        }
    }
}

impl Record for MetricCtx<'_> {
    type Field = MetricField;

    fn field_value(&self, field: MetricField) -> Option<Vec<u8>> {
        match field {
            MetricField::Name => non_empty(self.name),
            MetricField::Description => non_empty(self.description),
            MetricField::Unit => non_empty(self.unit),
            MetricField::Type => Some(self.metric_type.as_str().as_bytes().to_vec()),
            MetricField::AggregationTemporality => match self.temporality {
                AggregationTemporality::Delta => Some(b"delta".to_vec()),
                AggregationTemporality::Cumulative => Some(b"cumulative".to_vec()),
                AggregationTemporality::Unspecified => None,
            },
            MetricField::ScopeName => non_empty(&self.scope.as_ref()?.name),
            MetricField::ScopeVersion => non_empty(&self.scope.as_ref()?.version),
            MetricField::ResourceSchemaUrl => non_empty(self.resource_schema_url),
            MetricField::ScopeSchemaUrl => non_empty(self.scope_schema_url),
        }
    }

    fn attribute_value(&self, scope: AttrScope, path: &[String]) -> Option<Vec<u8>> {
        attrs::get_bytes(self.attrs(scope)?, path)
    }

    fn apply(&mut self, op: &TransformOp<MetricField>) -> bool {
        match op {
            TransformOp::Remove { field } => match field {
                FieldRef::Field(f) => match f {
                    MetricField::Name => remove_string(self.name),
                    MetricField::Description => remove_string(self.description),
                    MetricField::Unit => remove_string(self.unit),
                    _ => false,
                },
                FieldRef::Attr(attr) => attr_remove(self, attr),
            },
            TransformOp::Redact { field, value } => match field {
                FieldRef::Field(f) => match f {
                    MetricField::Name => redact_string(self.name, value),
                    MetricField::Description => redact_string(self.description, value),
                    MetricField::Unit => redact_string(self.unit, value),
                    _ => false,
                },
                FieldRef::Attr(attr) => attr_redact(self, attr, value),
            },
            TransformOp::Rename { field, to, upsert } => match field {
                FieldRef::Field(_) => false,
                FieldRef::Attr(attr) => attr_rename(self, attr, to, *upsert),
            },
            TransformOp::Add {
                field,
                value,
                upsert,
            } => match field {
                FieldRef::Field(f) => match f {
                    MetricField::Name => add_string(self.name, value, *upsert),
                    MetricField::Description => add_string(self.description, value, *upsert),
                    MetricField::Unit => add_string(self.unit, value, *upsert),
                    _ => false,
                },
                FieldRef::Attr(attr) => attr_add(self, attr, value, *upsert),
            },
        }
    }
}
