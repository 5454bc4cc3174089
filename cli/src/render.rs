//! Plain-text rendering of listings and reports.

use std::fmt::Write as _;

use rentlens_protocol::listing::Property;
use rentlens_protocol::report::CanonicalReport;

const MISSING: &str = "N/A";

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{v:.0}%"))
}

fn out_of_100(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{v:.0}/100"))
}

fn money(value: Option<f64>) -> String {
    let Some(value) = value else {
        return MISSING.to_string();
    };
    let whole = value.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if whole < 0 { "-" } else { "" };
    format!("{sign}${grouped}")
}

fn count(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{v}"))
}

/// One line per listing: id, address, price and layout.
pub fn listing_line(property: &Property) -> String {
    format!(
        "{:<12} {:<40} {:>10}  {} bd / {} ba",
        property.id.as_deref().unwrap_or("-"),
        property.address,
        money(property.price),
        count(property.beds),
        count(property.baths),
    )
}

pub fn property_details(property: &Property) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", property.address);
    if let Some(name) = &property.building_name {
        let _ = writeln!(out, "  Building: {name}");
    }
    let _ = writeln!(out, "  Price: {}", money(property.price));
    let _ = writeln!(
        out,
        "  Layout: {} bd / {} ba, {} sqft",
        count(property.beds),
        count(property.baths),
        count(property.sqft)
    );
    for (label, value) in [
        ("Type", &property.property_type),
        ("Status", &property.status),
        ("BBL", &property.bbl),
        ("Listing", &property.url),
    ] {
        if let Some(value) = value {
            let _ = writeln!(out, "  {label}: {value}");
        }
    }
    out
}

pub fn report(report: &CanonicalReport) -> String {
    if let Some(text) = &report.full_text {
        return format!("{}\n", text.trim_end());
    }

    let mut out = String::new();
    if !report.property.address.is_empty() {
        let _ = writeln!(out, "Transparency report: {}", report.property.address);
    }
    let _ = writeln!(out, "Overall grade: {}", percent(report.scores.overall));
    let _ = writeln!(
        out,
        "Quality: {}   Financial: {}",
        out_of_100(report.scores.quality),
        out_of_100(report.scores.financial)
    );

    let quality = &report.quality_audit;
    if !quality.recent_issues.is_empty() {
        let _ = writeln!(out, "\nRecent issues:");
        for issue in &quality.recent_issues {
            let _ = writeln!(out, "  - [{}] {}", issue.kind, issue.details);
        }
    }
    if let Some(note) = &quality.scouts_note {
        let _ = writeln!(out, "\nScout's note: {note}");
    }

    let financial = &report.financial_audit;
    if financial.city_market_value.is_some() || financial.annual_tax.is_some() {
        let _ = writeln!(
            out,
            "\nMarket value: {}   Annual tax: {}",
            money(financial.city_market_value),
            money(financial.annual_tax)
        );
    }
    if !financial.risk_factors.is_empty() {
        let _ = writeln!(out, "\nRisk factors:");
        for risk in &financial.risk_factors {
            let _ = writeln!(out, "  - {risk}");
        }
    }

    if let Some(level) = &report.recommendation.level {
        match &report.recommendation.reason {
            Some(reason) => {
                let _ = writeln!(out, "\nRecommendation: {level} - {reason}");
            }
            None => {
                let _ = writeln!(out, "\nRecommendation: {level}");
            }
        }
    }
    out
}
