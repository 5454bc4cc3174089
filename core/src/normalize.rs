//! Maps every report shape the upstream service produces onto
//! [`CanonicalReport`].
//!
//! Resolution order for raw text:
//! 1. a fenced code block tagged `json`,
//! 2. the whole text as one JSON document,
//! 3. the labeled extraction rules in [`crate::extract`],
//! 4. the raw-text fallback (`full_text`).
//!
//! Score keys are resolved through alias lists; the first alias holding a
//! non-null value wins.

use rentlens_protocol::number::number_from_value;
use rentlens_protocol::report::CanonicalReport;
use rentlens_protocol::report::FinancialAudit;
use rentlens_protocol::report::Issue;
use rentlens_protocol::report::PropertySummary;
use rentlens_protocol::report::QualityAudit;
use rentlens_protocol::report::Recommendation;
use rentlens_protocol::report::Scores;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

use crate::extract;

/// Source keys for `scores.overall`, highest priority first.
pub const OVERALL_ALIASES: &[&str] = &["overall_transparency_grade", "overall_grade", "overall"];
/// Source keys for `scores.quality`, highest priority first.
pub const QUALITY_ALIASES: &[&str] = &["quality_score", "quality"];
/// Source keys for `scores.financial`, highest priority first.
pub const FINANCIAL_ALIASES: &[&str] = &["financial_score", "financial"];

const MARKET_VALUE_ALIASES: &[&str] = &["city_market_value", "market_value"];
const ANNUAL_TAX_ALIASES: &[&str] = &["annual_tax", "annual_taxes", "tax"];
const RECOMMENDATION_ALIASES: &[&str] = &["recommendation", "final_recommendation"];
const ISSUE_ALIASES: &[&str] = &["recent_issues", "issues"];
const SCOUTS_NOTE_ALIASES: &[&str] = &["scouts_note", "scout_note", "note"];

/// First alias in `aliases` whose value in `obj` is present and not null.
pub fn resolve_alias<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

/// Like [`resolve_alias`], but the value must also read as a number.
pub fn resolve_number(obj: &Map<String, Value>, aliases: &[&str]) -> Option<f64> {
    aliases
        .iter()
        .filter_map(|key| obj.get(*key))
        .find_map(number_from_value)
}

/// Contents of the first fenced code block tagged `json` (any case), if any.
pub fn fenced_json(text: &str) -> Option<&str> {
    let after_tag = text.match_indices("```").find_map(|(i, fence)| {
        let rest = &text[i + fence.len()..];
        rest.get(..4)
            .filter(|tag| tag.eq_ignore_ascii_case("json"))
            .map(|_| &rest[4..])
    })?;
    // Skip the rest of the opening fence line when nothing else is on it.
    let body_start = match after_tag.find('\n') {
        Some(i) if after_tag[..i].trim().is_empty() => i + 1,
        _ => 0,
    };
    let body = &after_tag[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Normalize raw report text.
pub fn normalize_text(text: &str) -> CanonicalReport {
    if let Some(fenced) = fenced_json(text) {
        match serde_json::from_str::<Value>(fenced) {
            Ok(value) => return normalize_parsed(&value, text),
            Err(e) => debug!("fenced report block is not valid JSON: {e}"),
        }
    }

    if let Ok(value) = serde_json::from_str::<Value>(text.trim())
        && value.is_object()
    {
        return normalize_parsed(&value, text);
    }

    let extracted = extract::extract_report(text);
    if extracted.scores.is_empty() {
        debug!("no scores recovered from report text; keeping raw content");
        return CanonicalReport::fallback(text);
    }
    extracted
}

/// Normalize an already parsed JSON report.
pub fn normalize_value(value: &Value) -> CanonicalReport {
    let original = value.to_string();
    normalize_parsed(value, &original)
}

fn normalize_parsed(value: &Value, original: &str) -> CanonicalReport {
    let Some(obj) = value.as_object() else {
        return CanonicalReport::fallback(original);
    };
    let report = map_report(obj);
    if report.scores.is_empty() {
        return CanonicalReport::fallback(original);
    }
    report
}

fn map_report(obj: &Map<String, Value>) -> CanonicalReport {
    let scores_obj = obj.get("scores").and_then(Value::as_object);
    let quality_obj = obj.get("quality_audit").and_then(Value::as_object);
    let financial_obj = obj.get("financial_audit").and_then(Value::as_object);

    // Scores may sit under `scores` or, in flatter payloads, at the top level.
    let score = |aliases: &[&str]| {
        scores_obj
            .and_then(|s| resolve_number(s, aliases))
            .or_else(|| resolve_number(obj, aliases))
    };
    let mut scores = Scores {
        overall: score(OVERALL_ALIASES),
        quality: score(QUALITY_ALIASES),
        financial: score(FINANCIAL_ALIASES),
    };

    let mut quality_audit = quality_obj.map(map_quality_audit).unwrap_or_default();
    let mut financial_audit = financial_obj.map(map_financial_audit).unwrap_or_default();

    cross_fill(&mut scores.quality, &mut quality_audit.score);
    cross_fill(&mut scores.financial, &mut financial_audit.score);

    CanonicalReport {
        property: obj
            .get("property")
            .and_then(Value::as_object)
            .map(map_property)
            .unwrap_or_default(),
        scores,
        quality_audit,
        financial_audit,
        recommendation: resolve_alias(obj, RECOMMENDATION_ALIASES)
            .map(map_recommendation)
            .unwrap_or_default(),
        full_text: None,
    }
}

/// The same figure is reported both in `scores` and in the audit section;
/// whichever side is missing takes the other's value.
fn cross_fill(a: &mut Option<f64>, b: &mut Option<f64>) {
    match (*a, *b) {
        (Some(v), None) => *b = Some(v),
        (None, Some(v)) => *a = Some(v),
        _ => {}
    }
}

fn string_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    match resolve_alias(obj, aliases)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn map_property(obj: &Map<String, Value>) -> PropertySummary {
    PropertySummary {
        address: string_field(obj, &["address"]).unwrap_or_default(),
        building_name: string_field(obj, &["building_name", "building"]),
        beds: resolve_number(obj, &["beds", "bedrooms"]),
        baths: resolve_number(obj, &["baths", "bathrooms"]),
        sqft: resolve_number(obj, &["sqft", "square_feet"]),
    }
}

fn map_quality_audit(obj: &Map<String, Value>) -> QualityAudit {
    let recent_issues = resolve_alias(obj, ISSUE_ALIASES)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(map_issue).collect())
        .unwrap_or_default();
    QualityAudit {
        score: resolve_number(obj, &["score", "quality_score"]),
        recent_issues,
        scouts_note: string_field(obj, SCOUTS_NOTE_ALIASES),
    }
}

fn map_issue(value: &Value) -> Option<Issue> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(extract::parse_issue(s)),
        Value::Object(obj) => {
            let kind = string_field(obj, &["type", "category", "kind"]);
            let details = string_field(obj, &["details", "description", "detail"]);
            match (kind, details) {
                (None, None) => None,
                (kind, details) => Some(Issue {
                    kind: kind.unwrap_or_else(|| extract::GENERAL_ISSUE.to_string()),
                    details: details.unwrap_or_default(),
                }),
            }
        }
        _ => None,
    }
}

fn map_financial_audit(obj: &Map<String, Value>) -> FinancialAudit {
    let risk_factors = resolve_alias(obj, &["risk_factors", "risks"])
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    Value::Object(o) => string_field(o, &["details", "description", "factor"]),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    FinancialAudit {
        score: resolve_number(obj, &["score", "financial_score"]),
        city_market_value: resolve_number(obj, MARKET_VALUE_ALIASES),
        annual_tax: resolve_number(obj, ANNUAL_TAX_ALIASES),
        risk_factors,
    }
}

fn map_recommendation(value: &Value) -> Recommendation {
    match value {
        Value::String(s) => extract::parse_recommendation(s),
        Value::Object(obj) => Recommendation {
            level: string_field(obj, &["level", "verdict", "rating"]),
            reason: string_field(obj, &["reason", "rationale", "summary"]),
        },
        _ => Recommendation::default(),
    }
}
