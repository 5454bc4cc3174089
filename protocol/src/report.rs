use serde::Deserialize;
use serde::Serialize;

/// Normalized transparency report. Every producer shape (fenced JSON, bare
/// JSON, labeled markdown) is mapped onto this one structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalReport {
    pub property: PropertySummary,
    pub scores: Scores,
    pub quality_audit: QualityAudit,
    pub financial_audit: FinancialAudit,
    pub recommendation: Recommendation,
    /// Raw content kept when no structure could be recovered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
}

impl CanonicalReport {
    /// Raw-text fallback used when nothing structured could be extracted.
    pub fn fallback(text: impl Into<String>) -> Self {
        Self {
            full_text: Some(text.into()),
            ..Self::default()
        }
    }

    /// A report is complete exactly when an overall grade is present.
    pub fn is_complete(&self) -> bool {
        self.scores.overall.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySummary {
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baths: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqft: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial: Option<f64>,
}

impl Scores {
    pub fn is_empty(&self) -> bool {
        self.overall.is_none() && self.quality.is_none() && self.financial.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityAudit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default)]
    pub recent_issues: Vec<Issue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scouts_note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: String,
    pub details: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialAudit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_market_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_tax: Option<f64>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
