//! Sampling threshold write-back.
//!
//! When a span is kept via probabilistic sampling, the applied threshold is
//! recorded in its W3C tracestate under the OpenTelemetry `ot` vendor key as
//! a `th:<hex>` sub-entry, so downstream samplers and backends can account
//! for the adjusted count. The hex value is the 56-bit rejection threshold
//! with trailing zeros trimmed.

/// Encode a keep percentage as an OpenTelemetry `th` threshold value.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn threshold_hex(percentage: f64) -> String {
    let keep = (percentage / 100.0).clamp(0.0, 1.0);
    let rejection = ((1.0 - keep) * (1u64 << 56) as f64) as u64;
    let hex = format!("{rejection:014x}");
    let trimmed = hex.trim_end_matches('0');
    if trimmed.is_empty() {
        "0".to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Merge an OpenTelemetry sub-entry (e.g. `th:8` or `rv:abcd`) into a W3C
/// tracestate string under the `ot` vendor key.
///
/// Any previous sub-entry with the same sub-key is replaced; other `ot`
/// sub-entries and other vendors' entries are preserved. The `ot` entry is
/// emitted first.
pub fn merge_ot_tracestate(tracestate: &str, subkv: &str) -> String {
    let sub_key = subkv.split(':').next().unwrap_or(subkv);

    let mut ot_parts: Vec<&str> = Vec::new();
    let mut other_vendors: Vec<&str> = Vec::new();

    for vendor in tracestate.split(',') {
        let vendor = vendor.trim();
        if vendor.is_empty() {
            continue;
        }
        if let Some(ot_value) = vendor.strip_prefix("ot=") {
            for part in ot_value.split(';') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                let part_key = part.split(':').next().unwrap_or(part);
                if part_key != sub_key {
                    ot_parts.push(part);
                }
            }
        } else {
            other_vendors.push(vendor);
        }
    }

    ot_parts.push(subkv);
    let mut result = format!("ot={}", ot_parts.join(";"));
    if !other_vendors.is_empty() {
        result.push(',');
        result.push_str(&other_vendors.join(","));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_encoding() {
        // 50% keep -> rejection threshold 2^55 -> "8"
        assert_eq!(threshold_hex(50.0), "8");
        // 25% keep -> 0.75 * 2^56 -> "c"
        assert_eq!(threshold_hex(25.0), "c");
        // 100% keep -> zero rejection -> "0"
        assert_eq!(threshold_hex(100.0), "0");
    }

    #[test]
    fn merge_into_empty_tracestate() {
        assert_eq!(merge_ot_tracestate("", "th:8"), "ot=th:8");
    }

    #[test]
    fn merge_replaces_existing_threshold() {
        assert_eq!(merge_ot_tracestate("ot=th:4", "th:8"), "ot=th:8");
    }

    #[test]
    fn merge_preserves_other_ot_subkeys() {
        assert_eq!(
            merge_ot_tracestate("ot=rv:abcd;th:4", "th:8"),
            "ot=rv:abcd;th:8"
        );
    }

    #[test]
    fn merge_preserves_other_vendors() {
        assert_eq!(
            merge_ot_tracestate("congo=t61rcWkgMzE,ot=th:4", "th:8"),
            "ot=th:8,congo=t61rcWkgMzE"
        );
    }

    #[test]
    fn merge_skips_blank_entries() {
        assert_eq!(
            merge_ot_tracestate(" , ot= th:4 ; , vendor=x", "th:8"),
            "ot=th:8,vendor=x"
        );
    }
}
