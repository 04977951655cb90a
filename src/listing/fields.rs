//! Lenient field access over loosely-shaped JSON rows.

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// First value among `keys` that is present, non-null and not blank.
pub fn pick_first<'a>(row: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find(|value| match value {
            Value::Null => false,
            Value::String(text) => !text.trim().is_empty(),
            _ => true,
        })
}

/// Text form of a scalar value; strings are returned without quotes.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Numeric reading of a value, accepting numeric strings and booleans.
pub fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// JavaScript-style truthiness, used for flags such as `is_active`.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Integer id from the first usable key, 0 when missing or non-numeric.
pub fn record_id(row: &Value, keys: &[&str]) -> i64 {
    pick_first(row, keys)
        .and_then(value_number)
        .filter(|n| n.is_finite())
        .map(|n| n as i64)
        .unwrap_or(0)
}

/// Milliseconds since the epoch of the first usable timestamp key.
///
/// Returns 0 when no key holds a parseable timestamp.
pub fn sortable_time(row: &Value, keys: &[&str]) -> i64 {
    pick_first(row, keys)
        .and_then(|value| match value {
            Value::String(text) => parse_timestamp(text),
            Value::Number(number) => number.as_i64(),
            _ => None,
        })
        .unwrap_or(0)
}

/// Parse RFC 3339, naive `YYYY-MM-DDTHH:MM[:SS[.f]]` (as UTC) or a bare date.
pub fn parse_timestamp(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(parsed) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(unix_millis(parsed));
    }
    let naive = text.replacen(' ', "T", 1);
    let with_fraction = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
    let with_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let minutes_only = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    for format in [with_fraction, with_seconds, minutes_only] {
        if let Ok(parsed) = PrimitiveDateTime::parse(&naive, format) {
            return Some(unix_millis(parsed.assume_utc()));
        }
    }
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| unix_millis(date.midnight().assume_utc()))
}

fn unix_millis(moment: OffsetDateTime) -> i64 {
    (moment.unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pick_first_skips_null_and_blank() {
        let row = json!({"status": null, "state": "  ", "status_code": 2});
        assert_eq!(pick_first(&row, &["status", "state", "status_code"]), Some(&json!(2)));
        assert_eq!(pick_first(&row, &["missing"]), None);
    }

    #[test]
    fn timestamps_in_several_shapes() {
        let utc = parse_timestamp("2024-03-01T10:00:00Z").unwrap();
        assert_eq!(parse_timestamp("2024-03-01T10:00:00").unwrap(), utc);
        assert_eq!(parse_timestamp("2024-03-01 10:00").unwrap(), utc);
        assert_eq!(parse_timestamp("2024-03-01T11:00:00+01:00").unwrap(), utc);
        assert_eq!(parse_timestamp("2024-03-01T10:00:00.250").unwrap(), utc + 250);
        assert_eq!(
            parse_timestamp("2024-03-01").unwrap(),
            utc - 10 * 3_600_000
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn unparseable_times_sort_as_zero() {
        let row = json!({"changed": "n/a", "created": "2024-01-01"});
        assert_eq!(sortable_time(&row, &["changed", "created"]), 0);
        assert_eq!(sortable_time(&json!({}), &["changed"]), 0);
    }

    #[test]
    fn ids_accept_numeric_strings() {
        assert_eq!(record_id(&json!({"pk": "17"}), &["id", "pk"]), 17);
        assert_eq!(record_id(&json!({"id": "x"}), &["id"]), 0);
    }

    #[test]
    fn truthiness_matches_loose_flags() {
        assert!(truthy(Some(&json!(true))));
        assert!(truthy(Some(&json!(1))));
        assert!(truthy(Some(&json!("yes"))));
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(Some(&json!(""))));
        assert!(!truthy(None));
    }
}
