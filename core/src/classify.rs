//! Decides what a single `message` payload means for the report in
//! progress.

use serde_json::Value;

use crate::normalize::OVERALL_ALIASES;
use crate::normalize::fenced_json;
use crate::normalize::resolve_number;

#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    /// A complete structured report. Carries the parsed object.
    Final(Value),
    /// A structured fragment without a numeric overall grade yet. Discarded.
    Partial,
    /// Free-form text to append to the draft.
    Incremental(String),
}

pub fn classify(content: &str) -> Chunk {
    let Some(obj) = parse_structured(content) else {
        return Chunk::Incremental(content.to_string());
    };
    let Some(map) = obj.as_object() else {
        return Chunk::Incremental(content.to_string());
    };

    let scores = map.get("scores").and_then(Value::as_object);
    if scores.is_some_and(|s| resolve_number(s, OVERALL_ALIASES).is_some()) {
        return Chunk::Final(obj);
    }
    if scores.is_some() || map.contains_key("property") {
        return Chunk::Partial;
    }
    Chunk::Incremental(content.to_string())
}

fn parse_structured(content: &str) -> Option<Value> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed)
        .ok()
        .or_else(|| fenced_json(content).and_then(|body| serde_json::from_str(body).ok()))
}
