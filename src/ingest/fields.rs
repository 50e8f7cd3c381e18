//! Ordered-fallback field extraction from loosely typed upstream JSON.
//!
//! Every helper takes a list of candidate keys and returns the first one that
//! yields a usable value, so "field A, else field B" reads as a slice literal.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// First non-blank string among `keys`.
pub fn first_str<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| raw.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// First id-like value among `keys`; strings and integers are both accepted.
pub fn first_id(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match raw.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First number among `keys`; numeric strings ("12000") count as numbers.
pub fn first_f64(raw: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| as_f64(raw.get(*k)?))
}

/// Like [`first_f64`] but for non-negative counters.
pub fn first_u64(raw: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|k| {
        let v = raw.get(*k)?;
        v.as_u64().or_else(|| {
            let f = as_f64(v)?;
            (f.is_finite() && f >= 0.0).then(|| f as u64)
        })
    })
}

pub fn first_bool(raw: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|k| raw.get(*k)?.as_bool())
}

/// First timestamp among `keys`: RFC 3339 strings or unix seconds
/// (numbers or numeric strings; values that look like milliseconds are scaled).
pub fn first_timestamp(raw: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    keys.iter().find_map(|k| {
        let v = raw.get(*k)?;
        if let Some(s) = v.as_str() {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
                return Some(dt.with_timezone(&Utc));
            }
        }
        as_f64(v).and_then(from_unix)
    })
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn from_unix(secs: f64) -> Option<DateTime<Utc>> {
    if secs <= 0.0 {
        return None;
    }
    let secs = if secs > 1e12 { secs / 1000.0 } else { secs };
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9) as u32;
    DateTime::from_timestamp(whole, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falls_back_in_order() {
        let v = json!({ "title": "  ", "desc": "dance challenge", "text": "other" });
        assert_eq!(first_str(&v, &["title", "desc", "text"]), Some("dance challenge"));
        assert_eq!(first_str(&v, &["missing"]), None);
    }

    #[test]
    fn ids_accept_numbers() {
        let v = json!({ "id": 7281, "videoId": "abc" });
        assert_eq!(first_id(&v, &["id", "videoId"]).as_deref(), Some("7281"));
        assert_eq!(first_id(&json!({ "id": null }), &["id"]), None);
    }

    #[test]
    fn counters_parse_strings() {
        let v = json!({ "viewCount": "100000", "likeCount": 5000, "bad": "n/a" });
        assert_eq!(first_u64(&v, &["viewCount"]), Some(100_000));
        assert_eq!(first_u64(&v, &["likeCount"]), Some(5_000));
        assert_eq!(first_u64(&v, &["bad"]), None);
        assert_eq!(first_f64(&v, &["bad", "viewCount"]), Some(100_000.0));
    }

    #[test]
    fn timestamps_from_strings_seconds_and_millis() {
        let iso = json!({ "t": "2024-05-01T12:00:00Z" });
        let secs = json!({ "t": 1_714_564_800.0 });
        let millis = json!({ "t": 1_714_564_800_000i64 });
        let expected = DateTime::from_timestamp(1_714_564_800, 0).unwrap();
        assert_eq!(first_timestamp(&iso, &["t"]), Some(expected));
        assert_eq!(first_timestamp(&secs, &["t"]), Some(expected));
        assert_eq!(first_timestamp(&millis, &["t"]), Some(expected));
        assert_eq!(first_timestamp(&json!({ "t": "soon" }), &["t"]), None);
    }
}
