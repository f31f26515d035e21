//! Nested attribute map primitives.
//!
//! OTLP attribute maps are insertion-ordered `Vec<KeyValue>` lists whose
//! values may nest recursively through `KvlistValue`. These primitives walk a
//! `[k1, k2, …]` path with precise miss semantics:
//!
//! - `get_*` and [`remove`] never create anything; a missing or non-map
//!   intermediate is a miss.
//! - [`set_string`] stores at the leaf when the walk reaches a map, but never
//!   creates intermediates; it reports whether the leaf key pre-existed.
//! - [`upsert_string`] is the only primitive that creates intermediate maps,
//!   replacing non-map intermediates as it goes. It always succeeds.
//!
//! Intermediate maps are never pruned, even when a removal leaves them empty.

use opentelemetry_proto::tonic::common::v1::{any_value::Value, AnyValue, KeyValue, KeyValueList};

use crate::coerce::{value_bytes, value_display};

/// Build a string `AnyValue`.
pub fn string_value(value: &str) -> AnyValue {
    AnyValue {
        value: Some(Value::StringValue(value.to_owned())),
    }
}

fn empty_map() -> AnyValue {
    AnyValue {
        value: Some(Value::KvlistValue(KeyValueList { values: Vec::new() })),
    }
}

fn key_value(key: &str, value: AnyValue) -> KeyValue {
    KeyValue {
        key: key.to_owned(),
        value: Some(value),
    }
}

fn as_map(value: Option<&AnyValue>) -> Option<&KeyValueList> {
    match value?.value.as_ref()? {
        Value::KvlistValue(list) => Some(list),
        _ => None,
    }
}

/// Get the coerced byte value at a path; absent on any miss along the walk.
pub fn get_bytes(attrs: &[KeyValue], path: &[String]) -> Option<Vec<u8>> {
    let (first, rest) = path.split_first()?;
    let kv = attrs.iter().find(|kv| kv.key == *first)?;
    if rest.is_empty() {
        return value_bytes(kv.value.as_ref());
    }
    get_bytes(&as_map(kv.value.as_ref())?.values, rest)
}

/// Get the display string at a path. Unlike [`get_bytes`] this reports
/// presence faithfully: an empty-string attribute yields `Some("")`.
pub fn get_string(attrs: &[KeyValue], path: &[String]) -> Option<String> {
    let (first, rest) = path.split_first()?;
    let kv = attrs.iter().find(|kv| kv.key == *first)?;
    if rest.is_empty() {
        return Some(value_display(kv.value.as_ref()));
    }
    get_string(&as_map(kv.value.as_ref())?.values, rest)
}

/// Remove the leaf key at a path. Returns whether it existed.
pub fn remove(attrs: &mut Vec<KeyValue>, path: &[String]) -> bool {
    let Some((first, rest)) = path.split_first() else {
        return false;
    };
    if rest.is_empty() {
        let Some(index) = attrs.iter().position(|kv| kv.key == *first) else {
            return false;
        };
        attrs.remove(index);
        return true;
    }

    let Some(kv) = attrs.iter_mut().find(|kv| kv.key == *first) else {
        return false;
    };
    match kv.value.as_mut().and_then(|v| v.value.as_mut()) {
        Some(Value::KvlistValue(list)) => remove(&mut list.values, rest),
        _ => false,
    }
}

/// Store a string at a path if the walk reaches a map. Returns whether the
/// leaf key pre-existed; a missing or non-map intermediate is a miss and
/// leaves the map untouched.
pub fn set_string(attrs: &mut Vec<KeyValue>, path: &[String], value: &str) -> bool {
    let Some((first, rest)) = path.split_first() else {
        return false;
    };
    if rest.is_empty() {
        if let Some(kv) = attrs.iter_mut().find(|kv| kv.key == *first) {
            kv.value = Some(string_value(value));
            return true;
        }
        attrs.push(key_value(first, string_value(value)));
        return false;
    }

    let Some(kv) = attrs.iter_mut().find(|kv| kv.key == *first) else {
        return false;
    };
    match kv.value.as_mut().and_then(|v| v.value.as_mut()) {
        Some(Value::KvlistValue(list)) => set_string(&mut list.values, rest, value),
        _ => false,
    }
}

/// Store a string at a path, creating intermediate maps and replacing
/// non-map intermediates as needed.
pub fn upsert_string(attrs: &mut Vec<KeyValue>, path: &[String], value: &str) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    if rest.is_empty() {
        if let Some(kv) = attrs.iter_mut().find(|kv| kv.key == *first) {
            kv.value = Some(string_value(value));
        } else {
            attrs.push(key_value(first, string_value(value)));
        }
        return;
    }

    let index = match attrs.iter().position(|kv| kv.key == *first) {
        Some(index) => index,
        None => {
            attrs.push(key_value(first, empty_map()));
            attrs.len() - 1
        }
    };
    let slot = &mut attrs[index];
    if as_map(slot.value.as_ref()).is_none() {
        slot.value = Some(empty_map());
    }
    if let Some(Value::KvlistValue(list)) = slot.value.as_mut().and_then(|v| v.value.as_mut()) {
        upsert_string(&mut list.values, rest, value);
    }
}
