use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::validation::{
    DataQualityScore, EoriResult, MaterialityAssessment, ValidationIssue, ValidationResult,
};

/// Quarterly CBAM report header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub reporting_year: i32,
    pub reporting_quarter: u8,
    #[serde(default)]
    pub declarant_eori: Option<String>,
    #[serde(default)]
    pub member_state: Option<String>,
    #[serde(default)]
    pub certificates_surrendered: u64,
}

impl SubmissionReport {
    /// Last day of the month following the reporting quarter, or `None` for an invalid quarter.
    pub fn deadline(&self) -> Option<NaiveDate> {
        quarter_deadline(self.reporting_year, self.reporting_quarter)
    }
}

pub fn quarter_deadline(year: i32, quarter: u8) -> Option<NaiveDate> {
    if !(1..=4).contains(&quarter) {
        return None;
    }
    // Deadline month follows the quarter's last month; Q4 rolls into January.
    let (year, month) = match quarter {
        4 => (year.checked_add(1)?, 1),
        q => (year, u32::from(q) * 3 + 1),
    };
    NaiveDate::from_ymd_opt(year, month + 1, 1)?.pred_opt()
}

/// Checks and certificate figure for one entry of the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryReadiness {
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cn_code: Option<String>,
    pub validation: ValidationResult,
    pub data_quality: DataQualityScore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eori: Option<EoriResult>,
    pub materiality: MaterialityAssessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificates_required: Option<u64>,
    pub requires_verification: bool,
    pub verified: bool,
    /// Issues raised outside field validation (EORI, materiality, certificates, verification).
    pub findings: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateBalance {
    pub required: u64,
    pub surrendered: u64,
    pub shortfall: u64,
}

impl CertificateBalance {
    pub fn new(required: u64, surrendered: u64) -> Self {
        Self {
            required,
            surrendered,
            shortfall: required.saturating_sub(surrendered),
        }
    }

    pub fn is_sufficient(&self) -> bool {
        self.shortfall == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationCoverage {
    pub requiring_verification: usize,
    pub verified: usize,
    pub unverified: Vec<String>,
}

/// Component rates (0 to 100) blended into the readiness score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessScores {
    pub metadata: f64,
    pub entry_compliance_rate: f64,
    pub eori_pass_rate: f64,
    pub average_data_quality: f64,
    pub certificate_sufficiency: f64,
    pub verification_rate: f64,
}

impl ReadinessScores {
    pub const METADATA_WEIGHT: f64 = 0.15;
    pub const COMPLIANCE_WEIGHT: f64 = 0.30;
    pub const EORI_WEIGHT: f64 = 0.15;
    pub const DATA_QUALITY_WEIGHT: f64 = 0.20;
    pub const CERTIFICATE_WEIGHT: f64 = 0.10;
    pub const VERIFICATION_WEIGHT: f64 = 0.10;

    pub fn blended(&self) -> f64 {
        let score = self.metadata * Self::METADATA_WEIGHT
            + self.entry_compliance_rate * Self::COMPLIANCE_WEIGHT
            + self.eori_pass_rate * Self::EORI_WEIGHT
            + self.average_data_quality * Self::DATA_QUALITY_WEIGHT
            + self.certificate_sufficiency * Self::CERTIFICATE_WEIGHT
            + self.verification_rate * Self::VERIFICATION_WEIGHT;
        (score * 10.0).round() / 10.0
    }
}

/// An issue attributed to the report header or to one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchIssue {
    /// `report` for header checks, otherwise the entry reference.
    pub scope: String,
    #[serde(flatten)]
    pub issue: ValidationIssue,
}

/// Minimum readiness score for a submittable batch to be reported as ready.
pub const READY_READINESS_SCORE: f64 = 95.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReadiness {
    pub reporting_year: i32,
    pub reporting_quarter: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    pub assessed_on: NaiveDate,
    pub entry_count: usize,
    pub entries: Vec<EntryReadiness>,
    pub high_risk_codes: Vec<String>,
    pub certificates: CertificateBalance,
    pub verification: VerificationCoverage,
    pub scores: ReadinessScores,
    pub readiness_score: f64,
    pub can_submit: bool,
    pub ready_for_submission: bool,
    pub blocking_reasons: Vec<BatchIssue>,
    pub warnings: Vec<BatchIssue>,
}
