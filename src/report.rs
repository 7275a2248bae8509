//! Risk classification and audit report assembly.
//!
//! Maps numeric risk scores to qualitative badges and normalizes/validates
//! the report shape exchanged with the registry. Reports can be assembled
//! locally from scan findings or arrive as JSON from the external LLM audit
//! step; both paths go through the same normalization rules.

use colored::Colorize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detect::{Finding, Severity};

/// Qualitative label derived from a 0-100 risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBadge {
    Safe,
    Low,
    Caution,
    Unsafe,
}

impl RiskBadge {
    /// Threshold table: 0 → SAFE, 1-10 → LOW, 11-30 → CAUTION, >30 → UNSAFE.
    pub fn from_score(score: u32) -> Self {
        match score {
            0 => RiskBadge::Safe,
            1..=10 => RiskBadge::Low,
            11..=30 => RiskBadge::Caution,
            _ => RiskBadge::Unsafe,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskBadge::Safe => "SAFE",
            RiskBadge::Low => "LOW",
            RiskBadge::Caution => "CAUTION",
            RiskBadge::Unsafe => "UNSAFE",
        }
    }

    /// Colored badge for terminal output.
    pub fn painted(&self) -> String {
        let text = format!(" {} ", self.label());
        match self {
            RiskBadge::Safe => text.bold().white().on_green().to_string(),
            RiskBadge::Low => text.white().on_green().to_string(),
            RiskBadge::Caution => text.bold().on_yellow().to_string(),
            RiskBadge::Unsafe => text.bold().white().on_red().to_string(),
        }
    }
}

impl std::fmt::Display for RiskBadge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Overall verdict carried in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Safe,
    Caution,
    Unsafe,
}

impl Verdict {
    /// Verdict implied by a risk score, mirroring the badge thresholds.
    pub fn from_score(score: u32) -> Self {
        match RiskBadge::from_score(score) {
            RiskBadge::Safe | RiskBadge::Low => Verdict::Safe,
            RiskBadge::Caution => Verdict::Caution,
            RiskBadge::Unsafe => Verdict::Unsafe,
        }
    }
}

/// A completed audit report, as uploaded to the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub skill_slug: String,
    pub source_url: String,
    pub package_type: String,
    pub risk_score: u32,
    pub result: Verdict,
    pub max_severity: Severity,
    pub findings: Vec<Finding>,
    pub findings_count: usize,
}

impl Report {
    /// Assemble a report from scan output, computing the derived fields.
    pub fn assemble(
        skill_slug: &str,
        source_url: &str,
        package_type: &str,
        risk_score: u32,
        findings: Vec<Finding>,
    ) -> Self {
        let max_severity = max_severity(&findings);
        Self {
            skill_slug: skill_slug.to_string(),
            source_url: source_url.to_string(),
            package_type: package_type.to_string(),
            risk_score,
            result: Verdict::from_score(risk_score),
            max_severity,
            findings_count: findings.len(),
            findings,
        }
    }
}

/// Most severe value present, `None` for an empty list.
pub fn max_severity(findings: &[Finding]) -> Severity {
    findings
        .iter()
        .map(|f| f.severity)
        .max()
        .unwrap_or(Severity::None)
}

/// Report shape errors, surfaced before any upload attempt.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("missing required field \"{0}\" in report")]
    MissingField(&'static str),
    #[error("report must be a JSON object")]
    NotAnObject,
}

const REQUIRED_FIELDS: &[&str] = &["skill_slug", "source_url", "risk_score", "result"];

/// Validate and normalize an externally produced report JSON in place.
///
/// Extra fields the LLM step attaches (description, remediation,
/// is_by_design) are left untouched so they survive upload. `findings`
/// defaults to an empty list, `findings_count` is always recomputed, and a
/// missing `max_severity` is filled with the most severe finding value.
pub fn normalize_report(report: &mut serde_json::Value) -> Result<(), ReportError> {
    let Some(obj) = report.as_object_mut() else {
        return Err(ReportError::NotAnObject);
    };
    for field in REQUIRED_FIELDS {
        if obj.get(*field).map_or(true, |v| v.is_null()) {
            return Err(ReportError::MissingField(field));
        }
    }

    let findings = match obj.get("findings").and_then(|v| v.as_array()) {
        Some(findings) => findings.clone(),
        None => {
            obj.insert("findings".into(), serde_json::Value::Array(Vec::new()));
            Vec::new()
        }
    };
    obj.insert("findings_count".into(), findings.len().into());

    if obj.get("max_severity").map_or(true, |v| v.is_null()) {
        let max = findings
            .iter()
            .filter_map(|f| f.get("severity"))
            .filter_map(|s| s.as_str())
            .filter_map(|s| s.parse::<Severity>().ok())
            .max()
            .unwrap_or(Severity::None);
        obj.insert(
            "max_severity".into(),
            serde_json::Value::String(max.to_string()),
        );
    }

    Ok(())
}
