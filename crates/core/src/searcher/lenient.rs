//! Deserializers for the loosely typed numeric fields third-party APIs return.
//!
//! Providers send counts as JSON numbers, numeric strings, `null`, or garbage
//! depending on the endpoint. Anything that is not a usable number becomes 0.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn value_to_u64(value: &Value) -> u64 {
    if let Value::Number(n) = value {
        if let Some(v) = n.as_u64() {
            return v;
        }
    }
    if let Value::String(s) = value {
        if let Ok(v) = s.trim().parse::<u64>() {
            return v;
        }
    }
    match value_to_f64(value) {
        Some(f) if f.is_finite() && f > 0.0 => f.min(u64::MAX as f64) as u64,
        _ => 0,
    }
}

pub fn u32_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
    Ok(value_to_u64(&value).min(u32::MAX as u64) as u32)
}

pub fn u64_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
    Ok(value_to_u64(&value))
}

/// Accept a string or a number and render it as a string. Anything else is `None`.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Counts {
        #[serde(default, deserialize_with = "u32_or_zero")]
        seeders: u32,
        #[serde(default, deserialize_with = "u64_or_zero")]
        size: u64,
        #[serde(default, deserialize_with = "string_or_number")]
        id: Option<String>,
    }

    fn parse(json: &str) -> Counts {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_numbers_and_numeric_strings() {
        let c = parse(r#"{"seeders": 12, "size": "1048576", "id": 7}"#);
        assert_eq!(c.seeders, 12);
        assert_eq!(c.size, 1_048_576);
        assert_eq!(c.id.as_deref(), Some("7"));
    }

    #[test]
    fn test_garbage_becomes_zero() {
        let c = parse(r#"{"seeders": "lots", "size": null, "id": [1]}"#);
        assert_eq!(c.seeders, 0);
        assert_eq!(c.size, 0);
        assert!(c.id.is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let c = parse("{}");
        assert_eq!(c.seeders, 0);
        assert_eq!(c.size, 0);
    }

    #[test]
    fn test_negative_and_fractional() {
        let c = parse(r#"{"seeders": -4, "size": 12.9}"#);
        assert_eq!(c.seeders, 0);
        assert_eq!(c.size, 12);
    }

    #[test]
    fn test_overflow_saturates() {
        let c = parse(r#"{"seeders": 99999999999}"#);
        assert_eq!(c.seeders, u32::MAX);
    }
}
