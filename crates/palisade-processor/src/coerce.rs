//! Byte coercion of OTLP attribute values.
//!
//! Matching works on raw bytes, never on typed values; this module is the
//! single place that decides what an `AnyValue` looks like as bytes. The
//! absence rule matters downstream: `None` means "missing", and a returned
//! buffer is never empty, so callers can distinguish the two without length
//! checks. Empty strings and empty byte values are treated as absent.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use opentelemetry_proto::tonic::common::v1::{any_value::Value, AnyValue};

/// Coerce a value into its matchable byte form.
pub fn value_bytes(value: Option<&AnyValue>) -> Option<Vec<u8>> {
    let inner = value?.value.as_ref()?;
    match inner {
        Value::StringValue(s) if s.is_empty() => None,
        Value::StringValue(s) => Some(s.clone().into_bytes()),
        Value::IntValue(i) => Some(i.to_string().into_bytes()),
        Value::DoubleValue(d) => Some(d.to_string().into_bytes()),
        Value::BoolValue(true) => Some(b"true".to_vec()),
        Value::BoolValue(false) => Some(b"false".to_vec()),
        Value::BytesValue(b) if b.is_empty() => None,
        Value::BytesValue(b) => Some(b.clone()),
        Value::ArrayValue(_) | Value::KvlistValue(_) => {
            Some(json_render(Some(inner)).to_string().into_bytes())
        }
    }
}

/// Render a value as a display string, used when a transform transfers a
/// value between attributes. Unlike [`value_bytes`] this never treats a
/// present value as absent: an empty string stays an empty string.
pub fn value_display(value: Option<&AnyValue>) -> String {
    let Some(inner) = value.and_then(|v| v.value.as_ref()) else {
        return String::new();
    };
    match inner {
        Value::StringValue(s) => s.clone(),
        Value::IntValue(i) => i.to_string(),
        Value::DoubleValue(d) => d.to_string(),
        Value::BoolValue(b) => b.to_string(),
        Value::BytesValue(b) => BASE64.encode(b),
        Value::ArrayValue(_) | Value::KvlistValue(_) => json_render(Some(inner)).to_string(),
    }
}

/// Stable JSON rendering for composite values. Keys sort lexically, which
/// keeps the output independent of attribute insertion order.
fn json_render(value: Option<&Value>) -> serde_json::Value {
    let Some(value) = value else {
        return serde_json::Value::Null;
    };
    match value {
        Value::StringValue(s) => serde_json::Value::from(s.as_str()),
        Value::IntValue(i) => serde_json::Value::from(*i),
        Value::DoubleValue(d) => serde_json::Value::from(*d),
        Value::BoolValue(b) => serde_json::Value::from(*b),
        Value::BytesValue(b) => serde_json::Value::from(BASE64.encode(b)),
        Value::ArrayValue(array) => serde_json::Value::Array(
            array
                .values
                .iter()
                .map(|v| json_render(v.value.as_ref()))
                .collect(),
        ),
        Value::KvlistValue(kvlist) => serde_json::Value::Object(
            kvlist
                .values
                .iter()
                .map(|kv| {
                    (
                        kv.key.clone(),
                        json_render(kv.value.as_ref().and_then(|v| v.value.as_ref())),
                    )
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use opentelemetry_proto::tonic::common::v1::{ArrayValue, KeyValue, KeyValueList};

    use super::*;

    fn any(value: Value) -> AnyValue {
        AnyValue { value: Some(value) }
    }

    #[test]
    fn string_values() {
        assert_eq!(
            value_bytes(Some(&any(Value::StringValue("hello".into())))),
            Some(b"hello".to_vec())
        );
        assert_eq!(
            value_bytes(Some(&any(Value::StringValue(String::new())))),
            None
        );
    }

    #[test]
    fn numeric_values() {
        assert_eq!(
            value_bytes(Some(&any(Value::IntValue(42)))),
            Some(b"42".to_vec())
        );
        assert_eq!(
            value_bytes(Some(&any(Value::IntValue(-1)))),
            Some(b"-1".to_vec())
        );
        assert_eq!(
            value_bytes(Some(&any(Value::DoubleValue(3.14)))),
            Some(b"3.14".to_vec())
        );
        assert_eq!(
            value_bytes(Some(&any(Value::DoubleValue(0.95)))),
            Some(b"0.95".to_vec())
        );
    }

    #[test]
    fn bool_values() {
        assert_eq!(
            value_bytes(Some(&any(Value::BoolValue(true)))),
            Some(b"true".to_vec())
        );
        assert_eq!(
            value_bytes(Some(&any(Value::BoolValue(false)))),
            Some(b"false".to_vec())
        );
    }

    #[test]
    fn bytes_pass_through_verbatim() {
        assert_eq!(
            value_bytes(Some(&any(Value::BytesValue(vec![0x00, 0xff])))),
            Some(vec![0x00, 0xff])
        );
        assert_eq!(value_bytes(Some(&any(Value::BytesValue(Vec::new())))), None);
    }

    #[test]
    fn absent_values() {
        assert_eq!(value_bytes(None), None);
        assert_eq!(value_bytes(Some(&AnyValue { value: None })), None);
    }

    #[test]
    fn composite_values_render_as_json() {
        let map = any(Value::KvlistValue(KeyValueList {
            values: vec![KeyValue {
                key: "inner".into(),
                value: Some(any(Value::IntValue(7))),
            }],
        }));
        assert_eq!(value_bytes(Some(&map)), Some(br#"{"inner":7}"#.to_vec()));

        let slice = any(Value::ArrayValue(ArrayValue {
            values: vec![any(Value::StringValue("a".into())), any(Value::IntValue(1))],
        }));
        assert_eq!(value_bytes(Some(&slice)), Some(br#"["a",1]"#.to_vec()));
    }

    #[test]
    fn coerced_buffers_are_never_empty() {
        // Even the most degenerate composites render to non-empty JSON.
        let empty_map = any(Value::KvlistValue(KeyValueList { values: vec![] }));
        assert_eq!(value_bytes(Some(&empty_map)), Some(b"{}".to_vec()));

        let empty_slice = any(Value::ArrayValue(ArrayValue { values: vec![] }));
        assert_eq!(value_bytes(Some(&empty_slice)), Some(b"[]".to_vec()));
    }

    #[test]
    fn display_preserves_empty_strings() {
        assert_eq!(value_display(Some(&any(Value::StringValue(String::new())))), "");
        assert_eq!(value_display(None), "");
        assert_eq!(value_display(Some(&any(Value::IntValue(9)))), "9");
        assert_eq!(value_display(Some(&any(Value::BytesValue(vec![1, 2])))), "AQI=");
    }
}
