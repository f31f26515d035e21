//! Log record context.

use opentelemetry_proto::tonic::common::v1::{AnyValue, InstrumentationScope, KeyValue};
use opentelemetry_proto::tonic::logs::v1::LogRecord;
use opentelemetry_proto::tonic::resource::v1::Resource;
use palisade_policy::{AttrScope, FieldRef, LogField, Record, TransformOp};

use super::{
    add_id, add_string, attr_add, attr_redact, attr_remove, attr_rename, id_hex, non_empty,
    redact_id, redact_string, remove_id, remove_string, AttrAccess,
};
use crate::attrs::{self, string_value};
use crate::coerce::value_bytes;

const TRACE_ID_LEN: usize = 16;
const SPAN_ID_LEN: usize = 8;

/// Everything needed to evaluate one log record: the record itself plus its
/// parent resource and instrumentation scope.
pub struct LogCtx<'a> {
    pub record: &'a mut LogRecord,
    pub resource: &'a mut Option<Resource>,
    pub scope: &'a mut Option<InstrumentationScope>,
    pub resource_schema_url: &'a str,
    pub scope_schema_url: &'a str,
}

impl AttrAccess for LogCtx<'_> {
    fn attrs(&self, scope: AttrScope) -> Option<&[KeyValue]> {
        match scope {
            AttrScope::Resource => self.resource.as_ref().map(|r| r.attributes.as_slice()),
            AttrScope::Scope => self.scope.as_ref().map(|s| s.attributes.as_slice()),
            AttrScope::Record => Some(&self.record.attributes),
        }
    }

    fn attrs_mut(&mut self, scope: AttrScope) -> &mut Vec<KeyValue> {
        match scope {
            AttrScope::Resource => &mut self.resource.get_or_insert_with(Default::default).attributes,
            AttrScope::Scope => &mut self.scope.get_or_insert_with(Default::default).attributes,
            AttrScope::Record => &mut self.record.attributes,
        }
    }
}

impl Record for LogCtx<'_> {
    type Field = LogField;

    fn field_value(&self, field: LogField) -> Option<Vec<u8>> {
        match field {
            LogField::Body => value_bytes(self.record.body.as_ref()),
            LogField::SeverityText => non_empty(&self.record.severity_text),
            LogField::TraceId => id_hex(&self.record.trace_id),
            LogField::SpanId => id_hex(&self.record.span_id),
            LogField::EventName => non_empty(&self.record.event_name),
            LogField::ResourceSchemaUrl => non_empty(self.resource_schema_url),
            LogField::ScopeSchemaUrl => non_empty(self.scope_schema_url),
        }
    }

    fn attribute_value(&self, scope: AttrScope, path: &[String]) -> Option<Vec<u8>> {
        attrs::get_bytes(self.attrs(scope)?, path)
    }

    fn apply(&mut self, op: &TransformOp<LogField>) -> bool {
        match op {
            TransformOp::Remove { field } => match field {
                FieldRef::Field(f) => self.remove_field(*f),
                FieldRef::Attr(attr) => attr_remove(self, attr),
            },
            TransformOp::Redact { field, value } => match field {
                FieldRef::Field(f) => self.redact_field(*f, value),
                FieldRef::Attr(attr) => attr_redact(self, attr, value),
            },
            // Renames only make sense between attributes.
            TransformOp::Rename { field, to, upsert } => match field {
                FieldRef::Field(_) => false,
                FieldRef::Attr(attr) => attr_rename(self, attr, to, *upsert),
            },
            TransformOp::Add {
                field,
                value,
                upsert,
            } => match field {
                FieldRef::Field(f) => self.add_field(*f, value, *upsert),
                FieldRef::Attr(attr) => attr_add(self, attr, value, *upsert),
            },
        }
    }
}

impl LogCtx<'_> {
    fn remove_field(&mut self, field: LogField) -> bool {
        match field {
            LogField::Body => {
                let hit = body_present(&self.record.body);
                self.record.body = Some(string_value(""));
                hit
            }
            LogField::SeverityText => remove_string(&mut self.record.severity_text),
            LogField::TraceId => remove_id(&mut self.record.trace_id),
            LogField::SpanId => remove_id(&mut self.record.span_id),
            LogField::EventName => remove_string(&mut self.record.event_name),
            LogField::ResourceSchemaUrl | LogField::ScopeSchemaUrl => false,
        }
    }

    fn redact_field(&mut self, field: LogField, replacement: &str) -> bool {
        match field {
            LogField::Body => {
                let hit = body_present(&self.record.body);
                self.record.body = Some(string_value(replacement));
                hit
            }
            LogField::SeverityText => redact_string(&mut self.record.severity_text, replacement),
            LogField::TraceId => redact_id(&mut self.record.trace_id, TRACE_ID_LEN, replacement),
            LogField::SpanId => redact_id(&mut self.record.span_id, SPAN_ID_LEN, replacement),
            LogField::EventName => redact_string(&mut self.record.event_name, replacement),
            LogField::ResourceSchemaUrl | LogField::ScopeSchemaUrl => false,
        }
    }

    fn add_field(&mut self, field: LogField, value: &str, upsert: bool) -> bool {
        match field {
            LogField::Body => {
                if !upsert && body_present(&self.record.body) {
                    return true;
                }
                self.record.body = Some(string_value(value));
                true
            }
            LogField::SeverityText => add_string(&mut self.record.severity_text, value, upsert),
            LogField::TraceId => add_id(&mut self.record.trace_id, TRACE_ID_LEN, value, upsert),
            LogField::SpanId => add_id(&mut self.record.span_id, SPAN_ID_LEN, value, upsert),
            LogField::EventName => add_string(&mut self.record.event_name, value, upsert),
            LogField::ResourceSchemaUrl | LogField::ScopeSchemaUrl => false,
        }
    }
}

fn body_present(body: &Option<AnyValue>) -> bool {
    body.as_ref().is_some_and(|b| b.value.is_some())
}
