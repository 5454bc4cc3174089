//! Labeled field extraction for reports that arrive as markdown prose.
//!
//! Each [`ExtractionRule`] recognizes one `Label: value` line and is applied
//! in the order of [`RULES`]. A rule only ever takes its first match. Bullet
//! lists are read separately by section: bullets under a heading that
//! mentions issues become quality issues, bullets under a heading that
//! mentions risk become financial risk factors.

use std::sync::LazyLock;

use regex_lite::Regex;
use rentlens_protocol::number::parse_number;
use rentlens_protocol::report::CanonicalReport;
use rentlens_protocol::report::Issue;
use rentlens_protocol::report::Recommendation;

/// Issue type used when a bullet carries no `Type:` label.
pub const GENERAL_ISSUE: &str = "general";

/// Longest prefix still treated as an issue label in `Label: details`.
const MAX_ISSUE_LABEL_LEN: usize = 40;

/// Separator between a label and its value, tolerating markdown emphasis on
/// either side of the colon.
const SEP: &str = r"[*_\s]*:[*_\s]*";
const NUMBER: &str = r"(\d+(?:\.\d+)?)";
const CURRENCY: &str = r"\$\s*([\d,]+(?:\.\d+)?)";
const REST_OF_LINE: &str = r"(.+?)[*_\s]*$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Overall,
    Quality,
    Financial,
    MarketValue,
    AnnualTax,
    Address,
    ScoutsNote,
    Recommendation,
}

pub struct ExtractionRule {
    pub field: Field,
    regex: Regex,
}

impl ExtractionRule {
    fn new(field: Field) -> Self {
        #![allow(clippy::expect_used)]
        let pattern = match field {
            Field::Overall => format!(r"(?i)overall(?:\s+transparency)?\s+grade{SEP}{NUMBER}"),
            Field::Quality => format!(r"(?i)quality\s+score{SEP}{NUMBER}"),
            Field::Financial => format!(r"(?i)financial\s+score{SEP}{NUMBER}"),
            Field::MarketValue => format!(r"(?i)(?:city\s+)?market\s+value{SEP}{CURRENCY}"),
            Field::AnnualTax => format!(r"(?i)annual\s+tax(?:es)?{SEP}{CURRENCY}"),
            Field::Address => format!(r"(?im)^[\s*_#>-]*address{SEP}{REST_OF_LINE}"),
            Field::ScoutsNote => format!(r"(?im)scout(?:'|’)?s?\s+note{SEP}{REST_OF_LINE}"),
            Field::Recommendation => format!(r"(?im)recommendation{SEP}{REST_OF_LINE}"),
        };
        let regex = Regex::new(&pattern).expect("extraction patterns are valid");
        Self { field, regex }
    }

    /// The captured value of the first match in `text`.
    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
    }

    /// Write the captured value into `report`. Returns whether the rule
    /// matched and produced a usable value.
    pub fn apply(&self, text: &str, report: &mut CanonicalReport) -> bool {
        let Some(raw) = self.capture(text) else {
            return false;
        };
        match self.field {
            Field::Overall => set_number(&mut report.scores.overall, raw),
            Field::Quality => set_number(&mut report.scores.quality, raw),
            Field::Financial => set_number(&mut report.scores.financial, raw),
            Field::MarketValue => set_number(&mut report.financial_audit.city_market_value, raw),
            Field::AnnualTax => set_number(&mut report.financial_audit.annual_tax, raw),
            Field::Address => {
                report.property.address = strip_emphasis(raw);
                true
            }
            Field::ScoutsNote => {
                report.quality_audit.scouts_note = Some(strip_emphasis(raw));
                true
            }
            Field::Recommendation => {
                report.recommendation = parse_recommendation(raw);
                report.recommendation.level.is_some()
            }
        }
    }
}

fn set_number(slot: &mut Option<f64>, raw: &str) -> bool {
    *slot = parse_number(raw);
    slot.is_some()
}

/// Extraction rules in priority order.
pub static RULES: LazyLock<Vec<ExtractionRule>> = LazyLock::new(|| {
    [
        Field::Overall,
        Field::Quality,
        Field::Financial,
        Field::MarketValue,
        Field::AnnualTax,
        Field::Address,
        Field::ScoutsNote,
        Field::Recommendation,
    ]
    .into_iter()
    .map(ExtractionRule::new)
    .collect()
});

pub fn rule(field: Field) -> Option<&'static ExtractionRule> {
    RULES.iter().find(|r| r.field == field)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Issues,
    Risks,
}

/// Run every rule and the section reader over `text`. Fields that no rule
/// recognizes stay empty; the caller decides whether the result is usable.
pub fn extract_report(text: &str) -> CanonicalReport {
    let mut report = CanonicalReport::default();
    for rule in RULES.iter() {
        rule.apply(text, &mut report);
    }

    let mut section = Section::Other;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(item) = bullet_item(trimmed) {
            match section {
                Section::Issues => report.quality_audit.recent_issues.push(parse_issue(item)),
                Section::Risks => report.financial_audit.risk_factors.push(strip_emphasis(item)),
                Section::Other => {}
            }
            continue;
        }
        if is_heading(trimmed) {
            let heading = trimmed.to_ascii_lowercase();
            section = if heading.contains("issue") {
                Section::Issues
            } else if heading.contains("risk") {
                Section::Risks
            } else {
                Section::Other
            };
        }
    }

    report.quality_audit.score = report.scores.quality;
    report.financial_audit.score = report.scores.financial;
    report
}

fn bullet_item(line: &str) -> Option<&str> {
    ["- ", "* ", "• ", "+ "]
        .iter()
        .find_map(|marker| line.strip_prefix(marker))
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

fn is_heading(line: &str) -> bool {
    line.starts_with('#')
        || (line.starts_with("**") && line.trim_end_matches(':').ends_with("**"))
        || (line.ends_with(':') && line.len() <= 60)
}

fn strip_emphasis(raw: &str) -> String {
    raw.replace("**", "").replace('`', "").trim().to_string()
}

/// Split an issue bullet into `type` and `details`. `**HPD**: heat
/// complaint` and `HPD: heat complaint` carry a type; anything else is a
/// general issue.
pub fn parse_issue(raw: &str) -> Issue {
    let cleaned = strip_emphasis(raw);
    if let Some((label, details)) = cleaned.split_once(':') {
        let label = label.trim();
        let details = details.trim();
        if !label.is_empty() && label.len() <= MAX_ISSUE_LABEL_LEN && !details.is_empty() {
            return Issue {
                kind: label.to_string(),
                details: details.to_string(),
            };
        }
    }
    Issue {
        kind: GENERAL_ISSUE.to_string(),
        details: cleaned,
    }
}

/// `LEVEL - reason`, with any dash variant as separator. The reason clause
/// is optional.
pub fn parse_recommendation(raw: &str) -> Recommendation {
    let cleaned = strip_emphasis(raw);
    let split = [" - ", " – ", " — "]
        .iter()
        .filter_map(|sep| cleaned.split_once(sep))
        .min_by_key(|(level, _)| level.len());
    let (level, reason) = match split {
        Some((level, reason)) => (level.trim(), Some(reason.trim())),
        None => (cleaned.trim(), None),
    };
    Recommendation {
        level: Some(level.to_string()).filter(|l| !l.is_empty()),
        reason: reason.filter(|r| !r.is_empty()).map(str::to_string),
    }
}
