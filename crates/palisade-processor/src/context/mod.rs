//! Record contexts binding the policy engine to OTLP telemetry types.
//!
//! One context per signal wraps mutable borrows of a record and its parent
//! resource/scope containers, implementing [`palisade_policy::Record`] so
//! the generic engine can extract matchable values and apply transforms in
//! place. Shared scalar and attribute transform mechanics live here; the
//! per-signal field tables live in the submodules.

mod log;
mod metric;
mod trace;

pub use log::LogCtx;
pub use metric::{MetricCtx, MetricType};
pub use trace::TraceCtx;

use opentelemetry_proto::tonic::common::v1::KeyValue;
use palisade_policy::{AttrRef, AttrScope};

use crate::attrs;

/// A non-empty string as match bytes; empty means absent.
pub(crate) fn non_empty(s: &str) -> Option<Vec<u8>> {
    if s.is_empty() {
        None
    } else {
        Some(s.as_bytes().to_vec())
    }
}

/// An ID is unset when it is missing entirely or all zero.
pub(crate) fn id_is_empty(id: &[u8]) -> bool {
    id.iter().all(|b| *b == 0)
}

/// Lowercase-hex rendering of a trace/span ID; absent when unset.
pub(crate) fn id_hex(id: &[u8]) -> Option<Vec<u8>> {
    if id_is_empty(id) {
        None
    } else {
        Some(hex::encode(id).into_bytes())
    }
}

// ---------------------------------------------------------------------------
// Scalar field transform mechanics
// ---------------------------------------------------------------------------

pub(crate) fn remove_string(field: &mut String) -> bool {
    let hit = !field.is_empty();
    field.clear();
    hit
}

pub(crate) fn redact_string(field: &mut String, replacement: &str) -> bool {
    let hit = !field.is_empty();
    replacement.clone_into(field);
    hit
}

pub(crate) fn add_string(field: &mut String, value: &str, upsert: bool) -> bool {
    if !upsert && !field.is_empty() {
        return true;
    }
    value.clone_into(field);
    true
}

pub(crate) fn remove_id(id: &mut Vec<u8>) -> bool {
    let hit = !id_is_empty(id);
    id.clear();
    hit
}

/// Overwrite an ID with the replacement's bytes, truncated or zero-padded to
/// the ID width.
pub(crate) fn redact_id(id: &mut Vec<u8>, width: usize, replacement: &str) -> bool {
    let hit = !id_is_empty(id);
    *id = id_from_str(width, replacement);
    hit
}

pub(crate) fn add_id(id: &mut Vec<u8>, width: usize, value: &str, upsert: bool) -> bool {
    if !upsert && !id_is_empty(id) {
        return true;
    }
    *id = id_from_str(width, value);
    true
}

fn id_from_str(width: usize, value: &str) -> Vec<u8> {
    let mut id = vec![0u8; width];
    let n = width.min(value.len());
    id[..n].copy_from_slice(&value.as_bytes()[..n]);
    id
}

// ---------------------------------------------------------------------------
// Attribute transform mechanics
// ---------------------------------------------------------------------------

/// Access to the three attribute maps a context can address.
///
/// `attrs` returns `None` when the backing container is absent, which reads
/// as an empty map; `attrs_mut` materialises the container, so callers must
/// check presence first for operations that may not write.
pub(crate) trait AttrAccess {
    fn attrs(&self, scope: AttrScope) -> Option<&[KeyValue]>;
    fn attrs_mut(&mut self, scope: AttrScope) -> &mut Vec<KeyValue>;
}

pub(crate) fn attr_remove<C: AttrAccess>(ctx: &mut C, attr: &AttrRef) -> bool {
    if ctx.attrs(attr.scope).is_none() {
        return false;
    }
    attrs::remove(ctx.attrs_mut(attr.scope), &attr.path)
}

/// Redact only pre-existing attributes; a missing target is a miss, not an
/// insert.
pub(crate) fn attr_redact<C: AttrAccess>(ctx: &mut C, attr: &AttrRef, value: &str) -> bool {
    let Some(existing) = ctx.attrs(attr.scope) else {
        return false;
    };
    if attrs::get_string(existing, &attr.path).is_none() {
        return false;
    }
    attrs::set_string(ctx.attrs_mut(attr.scope), &attr.path, value)
}

/// Move the source value to key `to` at the root of the same attribute map.
/// The value transfers as its display string; the re-inserted key lands at
/// the end of the map unless `to` already existed.
pub(crate) fn attr_rename<C: AttrAccess>(
    ctx: &mut C,
    attr: &AttrRef,
    to: &str,
    upsert: bool,
) -> bool {
    let Some(existing) = ctx.attrs(attr.scope) else {
        return false;
    };
    let Some(value) = attrs::get_string(existing, &attr.path) else {
        return false;
    };

    let map = ctx.attrs_mut(attr.scope);
    if !upsert && map.iter().any(|kv| kv.key == to) {
        return true;
    }

    attrs::remove(map, &attr.path);
    if let Some(kv) = map.iter_mut().find(|kv| kv.key == to) {
        kv.value = Some(attrs::string_value(&value));
    } else {
        map.push(KeyValue {
            key: to.to_owned(),
            value: Some(attrs::string_value(&value)),
        });
    }
    true
}

pub(crate) fn attr_add<C: AttrAccess>(
    ctx: &mut C,
    attr: &AttrRef,
    value: &str,
    upsert: bool,
) -> bool {
    if !upsert {
        if let Some(existing) = ctx.attrs(attr.scope) {
            if attrs::get_string(existing, &attr.path).is_some() {
                return true;
            }
        }
    }
    attrs::upsert_string(ctx.attrs_mut(attr.scope), &attr.path, value);
    true
}
