//! Lenient numeric parsing shared by listing payloads and report fields.
//!
//! Upstream producers mix JSON numbers with decorated strings such as
//! `"80%"`, `"72/100"`, `"$1,250,000"` or the placeholder `"N/A"`.

use serde::Deserialize;
use serde::Deserializer;
use serde_json::Value;

/// Parses the leading number of a decorated string. Currency symbols,
/// thousands separators and markdown emphasis are ignored; anything after the
/// number (`%`, `/100`, units) is dropped.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw
        .trim()
        .trim_matches('*')
        .trim_start_matches('$')
        .trim();
    let mut digits = String::new();
    let mut seen_digit = false;
    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '0'..='9' => {
                seen_digit = true;
                digits.push(ch);
            }
            '.' => digits.push(ch),
            ',' if seen_digit => {}
            '-' if idx == 0 => digits.push(ch),
            _ => break,
        }
    }
    if !seen_digit {
        return None;
    }
    digits.parse::<f64>().ok()
}

/// Interprets a JSON value as a number: numbers pass through, strings go
/// through [`parse_number`], everything else is absent.
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

pub(crate) fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

pub(crate) fn deserialize_lenient_string<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() && s.trim() != "N/A" => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
