//! Per-entry regulatory checks: field rules, peer materiality, data quality and EORI grammar.
//!
//! Domain violations are reported as [`ValidationIssue`]s inside a result value; none of these
//! functions fail.

mod entry;
mod eori;
mod materiality;
mod quality;

pub use entry::validate_entry;
pub use eori::{
    validate_eori, validate_eori_batch, validate_for_cbam, ChecksumStatus, EoriBatchReport,
    EoriFailure, EoriResult, EoriValidator,
};
pub(crate) use materiality::{assess_in_batch, summarize as summarize_materiality};
pub use materiality::{
    assess_materiality, assess_materiality_batch, CodeMateriality, EntryMateriality,
    MaterialityAssessment, MaterialityReport, MaterialityTag, HIGH_RISK_MATERIAL_SHARE,
    MATERIALITY_THRESHOLD_PERCENT, VERIFIER_ACTION_THRESHOLD_PERCENT,
};
pub use quality::{
    score_data_quality, DataQualityScore, EmbeddedEmissionsCheck, QualityRating, QualityWeights,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Blocks submission.
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingRequiredField,
    InvalidFormat,
    OutOfRange,
    RegulatoryRuleViolation,
    CrossFieldInconsistency,
    UnclassifiedGood,
    NotAssessable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    pub severity: Severity,
    pub kind: IssueKind,
}

impl ValidationIssue {
    pub fn error(kind: IssueKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            citation: None,
            severity: Severity::Error,
            kind,
        }
    }

    pub fn warning(kind: IssueKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, field, message)
        }
    }

    pub fn cite(mut self, citation: &str) -> Self {
        self.citation = Some(citation.to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Minimum compliance score for an individually valid entry to count as submission ready.
pub const READY_COMPLIANCE_SCORE: u32 = 80;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
    pub valid: bool,
    pub error_count: usize,
    pub warning_count: usize,
    /// `max(0, 100 - 20 * errors - 5 * warnings)`.
    pub compliance_score: u32,
    pub ready_for_submission: bool,
}

impl ValidationResult {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let error_count = issues.iter().filter(|issue| issue.is_error()).count();
        let warning_count = issues.len() - error_count;
        let penalty = 20 * error_count + 5 * warning_count;
        let compliance_score = 100usize.saturating_sub(penalty) as u32;
        let valid = error_count == 0;

        Self {
            issues,
            valid,
            error_count,
            warning_count,
            compliance_score,
            ready_for_submission: valid && compliance_score >= READY_COMPLIANCE_SCORE,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| issue.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| !issue.is_error())
    }
}

pub(crate) mod citation {
    pub const GOODS_LIST: &str = "Regulation (EU) 2023/956, Annex I";
    pub const DEFINITIVE_PERIOD: &str = "Regulation (EU) 2023/956, Art. 36";
    pub const DECLARANT: &str = "Regulation (EU) 2023/956, Art. 5";
    pub const EMBEDDED_EMISSIONS: &str = "Regulation (EU) 2023/956, Art. 7 and Annex IV";
    pub const VERIFICATION: &str = "Regulation (EU) 2023/956, Art. 8 and Annex VI";
    pub const CARBON_PRICE: &str = "Regulation (EU) 2023/956, Art. 9";
    pub const FREE_ALLOCATION: &str = "Regulation (EU) 2023/956, Art. 31";
    pub const REPORTING: &str = "Implementing Regulation (EU) 2023/1773";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compliance_score_subtracts_weighted_issue_counts() {
        let issues = vec![
            ValidationIssue::error(IssueKind::InvalidFormat, "cn_code", "bad"),
            ValidationIssue::warning(IssueKind::MissingRequiredField, "customs", "missing"),
        ];
        let result = ValidationResult::from_issues(issues);
        assert_eq!(result.compliance_score, 75);
        assert!(!result.valid);
        assert!(!result.ready_for_submission);
        assert_eq!(result.errors().count(), 1);
        assert_eq!(result.warnings().count(), 1);
    }

    #[test]
    fn compliance_score_is_floored_at_zero() {
        let issues = (0..6)
            .map(|_| ValidationIssue::error(IssueKind::OutOfRange, "quantity", "bad"))
            .collect();
        assert_eq!(ValidationResult::from_issues(issues).compliance_score, 0);
    }

    #[test]
    fn warnings_alone_keep_an_entry_valid() {
        let issues = (0..5)
            .map(|_| ValidationIssue::warning(IssueKind::CrossFieldInconsistency, "x", "y"))
            .collect();
        let result = ValidationResult::from_issues(issues);
        assert!(result.valid);
        assert_eq!(result.compliance_score, 75);
        assert!(!result.ready_for_submission);
    }
}
