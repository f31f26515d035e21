//! Span context.

use opentelemetry_proto::tonic::common::v1::{InstrumentationScope, KeyValue};
use opentelemetry_proto::tonic::resource::v1::Resource;
use opentelemetry_proto::tonic::trace::v1::span::SpanKind;
use opentelemetry_proto::tonic::trace::v1::{status::StatusCode, Span};
use palisade_policy::{AttrScope, FieldRef, Record, TraceField, TransformOp};

use super::{
    add_id, add_string, attr_add, attr_redact, attr_remove, attr_rename, id_hex, non_empty,
    redact_id, redact_string, remove_id, remove_string, AttrAccess,
};
use crate::attrs;

const TRACE_ID_LEN: usize = 16;
const SPAN_ID_LEN: usize = 8;

/// Everything needed to evaluate one span.
pub struct TraceCtx<'a> {
    pub span: &'a mut Span,
    pub resource: &'a mut Option<Resource>,
    pub scope: &'a mut Option<InstrumentationScope>,
    pub resource_schema_url: &'a str,
    pub scope_schema_url: &'a str,
}

impl AttrAccess for TraceCtx<'_> {
    fn attrs(&self, scope: AttrScope) -> Option<&[KeyValue]> {
        match scope {
            AttrScope::Resource => self.resource.as_ref().map(|r| r.attributes.as_slice()),
            AttrScope::Scope => self.scope.as_ref().map(|s| s.attributes.as_slice()),
            AttrScope::Record => Some(&self.span.attributes),
        }
    }

    fn attrs_mut(&mut self, scope: AttrScope) -> &mut Vec<KeyValue> {
        match scope {
            AttrScope::Resource => &mut self.resource.get_or_insert_with(Default::default).attributes,
            AttrScope::Scope => &mut self.scope.get_or_insert_with(Default::default).attributes,
            AttrScope::Record => &mut self.span.attributes,
        }
    }
}

impl Record for TraceCtx<'_> {
    type Field = TraceField;

    fn field_value(&self, field: TraceField) -> Option<Vec<u8>> {
        match field {
            TraceField::Name => non_empty(&self.span.name),
            TraceField::TraceId => id_hex(&self.span.trace_id),
            TraceField::SpanId => id_hex(&self.span.span_id),
            TraceField::ParentSpanId => id_hex(&self.span.parent_span_id),
            TraceField::TraceState => non_empty(&self.span.trace_state),
            TraceField::Kind => match self.span.kind() {
                SpanKind::Internal => Some(b"internal".to_vec()),
                SpanKind::Server => Some(b"server".to_vec()),
                SpanKind::Client => Some(b"client".to_vec()),
                SpanKind::Producer => Some(b"producer".to_vec()),
                SpanKind::Consumer => Some(b"consumer".to_vec()),
                SpanKind::Unspecified => None,
            },
            TraceField::Status => match self.span.status.as_ref()?.code() {
                StatusCode::Ok => Some(b"ok".to_vec()),
                StatusCode::Error => Some(b"error".to_vec()),
                StatusCode::Unset => None,
            },
            TraceField::EventName => self
                .span
                .events
                .iter()
                .find(|event| !event.name.is_empty())
                .map(|event| event.name.as_bytes().to_vec()),
            TraceField::ScopeName => non_empty(&self.scope.as_ref()?.name),
            TraceField::ScopeVersion => non_empty(&self.scope.as_ref()?.version),
            TraceField::ResourceSchemaUrl => non_empty(self.resource_schema_url),
            TraceField::ScopeSchemaUrl => non_empty(self.scope_schema_url),
        }
    }

    fn attribute_value(&self, scope: AttrScope, path: &[String]) -> Option<Vec<u8>> {
        attrs::get_bytes(self.attrs(scope)?, path)
    }

    fn apply(&mut self, op: &TransformOp<TraceField>) -> bool {
        match op {
            TransformOp::Remove { field } => match field {
                FieldRef::Field(f) => match f {
                    TraceField::Name => remove_string(&mut self.span.name),
                    TraceField::TraceState => remove_string(&mut self.span.trace_state),
                    TraceField::TraceId => remove_id(&mut self.span.trace_id),
                    TraceField::SpanId => remove_id(&mut self.span.span_id),
                    TraceField::ParentSpanId => remove_id(&mut self.span.parent_span_id),
                    _ => false,
                },
                FieldRef::Attr(attr) => attr_remove(self, attr),
            },
            TransformOp::Redact { field, value } => match field {
                FieldRef::Field(f) => match f {
                    TraceField::Name => redact_string(&mut self.span.name, value),
                    TraceField::TraceState => redact_string(&mut self.span.trace_state, value),
                    TraceField::TraceId => redact_id(&mut self.span.trace_id, TRACE_ID_LEN, value),
                    TraceField::SpanId => redact_id(&mut self.span.span_id, SPAN_ID_LEN, value),
                    TraceField::ParentSpanId => {
                        redact_id(&mut self.span.parent_span_id, SPAN_ID_LEN, value)
                    }
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
                    TraceField::Name => add_string(&mut self.span.name, value, *upsert),
                    TraceField::TraceState => {
                        add_string(&mut self.span.trace_state, value, *upsert)
                    }
                    TraceField::TraceId => {
                        add_id(&mut self.span.trace_id, TRACE_ID_LEN, value, *upsert)
                    }
                    TraceField::SpanId => {
                        add_id(&mut self.span.span_id, SPAN_ID_LEN, value, *upsert)
                    }
                    TraceField::ParentSpanId => {
                        add_id(&mut self.span.parent_span_id, SPAN_ID_LEN, value, *upsert)
                    }
                    _ => false,
                },
                FieldRef::Attr(attr) => attr_add(self, attr, value, *upsert),
            },
        }
    }

    /// Low eight bytes of the trace ID, big-endian, shifted into the 63-bit
    /// sampling space. Spans without a trace ID sample as zero, surviving
    /// any non-zero percentage.
    fn sampling_randomness(&self) -> u64 {
        let id = &self.span.trace_id;
        if id.len() < 8 {
            return 0;
        }
        let low: [u8; 8] = match id[id.len() - 8..].try_into() {
            Ok(low) => low,
            Err(_) => return 0,
        };
        u64::from_be_bytes(low) >> 1
    }
}
