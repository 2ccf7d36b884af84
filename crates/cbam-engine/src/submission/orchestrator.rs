use std::sync::Arc;

use chrono::NaiveDate;
use tokio::task::JoinSet;

use super::domain::{
    BatchIssue, CertificateBalance, EntryReadiness, ReadinessScores, SubmissionReadiness,
    SubmissionReport, VerificationCoverage, READY_READINESS_SCORE,
};
use crate::calculation::{compute_entry_certificates, BenchmarkError, CalculationError};
use crate::entries::{present, EmissionEntry, VerificationStatus};
use crate::reference::{ReferenceTables, REGIME_START_YEAR};
use crate::validation::{
    assess_in_batch, citation, score_data_quality, summarize_materiality, validate_entry,
    validate_eori, validate_for_cbam, EntryMateriality, IssueKind, MaterialityTag,
    ValidationIssue,
};

/// Days before the deadline from which a warning is raised.
const DEADLINE_WARNING_DAYS: i64 = 7;
const METADATA_CHECKS: usize = 5;
const REPORT_SCOPE: &str = "report";

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("entry evaluation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Runs every per-entry check over the batch and folds the results into one verdict.
pub fn validate_for_submission(
    tables: &ReferenceTables,
    report: &SubmissionReport,
    entries: &[EmissionEntry],
    as_of: NaiveDate,
) -> SubmissionReadiness {
    let evaluated = (0..entries.len())
        .map(|position| evaluate_entry(tables, report, entries, position, as_of))
        .collect();
    aggregate(tables, report, evaluated, as_of)
}

/// Same verdict as [`validate_for_submission`], with per-entry checks fanned out on the blocking
/// pool. Aggregation waits for every entry.
pub async fn validate_for_submission_concurrent(
    tables: Arc<ReferenceTables>,
    report: SubmissionReport,
    entries: Vec<EmissionEntry>,
    as_of: NaiveDate,
) -> Result<SubmissionReadiness, SubmissionError> {
    let report = Arc::new(report);
    let entries: Arc<[EmissionEntry]> = Arc::from(entries);

    let mut tasks = JoinSet::new();
    for position in 0..entries.len() {
        let tables = Arc::clone(&tables);
        let report = Arc::clone(&report);
        let entries = Arc::clone(&entries);
        tasks.spawn_blocking(move || {
            let readiness = evaluate_entry(&tables, &report, &entries, position, as_of);
            (position, readiness)
        });
    }

    let mut slots: Vec<Option<EntryReadiness>> = vec![None; entries.len()];
    while let Some(joined) = tasks.join_next().await {
        let (position, readiness) = joined?;
        slots[position] = Some(readiness);
    }

    let evaluated = slots.into_iter().flatten().collect();
    Ok(aggregate(&tables, &report, evaluated, as_of))
}

fn evaluate_entry(
    tables: &ReferenceTables,
    report: &SubmissionReport,
    batch: &[EmissionEntry],
    position: usize,
    as_of: NaiveDate,
) -> EntryReadiness {
    let entry = &batch[position];
    let validation = validate_entry(tables, entry);
    let data_quality = score_data_quality(entry, as_of);
    let materiality = assess_in_batch(batch, position);
    let mut findings = Vec::new();

    let eori = present(&entry.declarant_eori)
        .or_else(|| present(&report.declarant_eori))
        .map(|identifier| match present(&report.member_state) {
            Some(member_state) => validate_for_cbam(tables, identifier, member_state),
            None => validate_eori(tables, identifier),
        });
    if let Some(result) = eori.as_ref().filter(|result| !result.valid) {
        let message = result.message.clone().unwrap_or_default();
        findings.push(
            ValidationIssue::error(
                IssueKind::InvalidFormat,
                "declarant_eori",
                format!("EORI {}: {message}", result.normalized),
            )
            .cite(citation::DECLARANT),
        );
    }

    match materiality.tag {
        MaterialityTag::Material | MaterialityTag::MandatoryVerifierAction => {
            let deviation = materiality.deviation_percent.unwrap_or_default();
            let mut message = format!(
                "direct intensity deviates {deviation:.1}% from {} peer entries",
                materiality.peer_count
            );
            if materiality.requires_verifier_action {
                message.push_str("; verifier action required");
            }
            findings.push(
                ValidationIssue::warning(IssueKind::OutOfRange, "direct_emissions_specific", message)
                    .cite(citation::VERIFICATION),
            );
        }
        MaterialityTag::ZeroBaseline => findings.push(ValidationIssue::warning(
            IssueKind::NotAssessable,
            "direct_emissions_specific",
            "peer entries report zero direct emissions; materiality not assessable",
        )),
        _ => {}
    }

    let certificates_required = match compute_entry_certificates(tables, entry) {
        Ok(certificates) => Some(certificates.chargeable.certificates_required),
        Err(CalculationError::Benchmark(BenchmarkError::UnclassifiedGood { cn_code })) => {
            // Malformed codes are already rejected by field validation.
            if cn_code.len() == 8 && cn_code.chars().all(|c| c.is_ascii_digit()) {
                findings.push(
                    ValidationIssue::error(
                        IssueKind::UnclassifiedGood,
                        "cn_code",
                        format!("no benchmark maps CN code {cn_code}; certificates cannot be determined"),
                    )
                    .cite(citation::GOODS_LIST),
                );
            }
            None
        }
        Err(error) => {
            findings.push(ValidationIssue::warning(
                IssueKind::NotAssessable,
                "certificates_required",
                format!("certificates could not be computed: {error}"),
            ));
            None
        }
    };

    let requires_verification = entry
        .calculation_method
        .map_or(false, |method| method.uses_actual_values());
    let verified = entry.verification_status == VerificationStatus::AccreditedSatisfactory;
    if requires_verification && !verified {
        findings.push(
            ValidationIssue::warning(
                IssueKind::RegulatoryRuleViolation,
                "verification_status",
                format!(
                    "actual emissions are not yet verified by an accredited verifier ({})",
                    entry.verification_status.label()
                ),
            )
            .cite(citation::VERIFICATION),
        );
    }

    EntryReadiness {
        reference: entry.reference(position),
        cn_code: entry.normalized_cn_code().map(str::to_string),
        validation,
        data_quality,
        eori,
        materiality,
        certificates_required,
        requires_verification,
        verified,
        findings,
    }
}

fn check_metadata(
    tables: &ReferenceTables,
    report: &SubmissionReport,
    as_of: NaiveDate,
) -> (Vec<ValidationIssue>, Option<NaiveDate>) {
    let mut issues = Vec::new();

    if report.reporting_year < REGIME_START_YEAR {
        issues.push(
            ValidationIssue::error(
                IssueKind::OutOfRange,
                "reporting_year",
                format!(
                    "reporting year {} is before the definitive period ({REGIME_START_YEAR})",
                    report.reporting_year
                ),
            )
            .cite(citation::DEFINITIVE_PERIOD),
        );
    }

    let deadline = report.deadline();
    if deadline.is_none() {
        issues.push(ValidationIssue::error(
            IssueKind::OutOfRange,
            "reporting_quarter",
            format!("reporting quarter must be 1 to 4, got {}", report.reporting_quarter),
        ));
    }

    if present(&report.declarant_eori).is_none() {
        issues.push(
            ValidationIssue::error(
                IssueKind::MissingRequiredField,
                "declarant_eori",
                "declarant EORI is required",
            )
            .cite(citation::DECLARANT),
        );
    }

    match present(&report.member_state) {
        None => issues.push(ValidationIssue::error(
            IssueKind::MissingRequiredField,
            "member_state",
            "member state of the declarant is required",
        )),
        Some(state) if !tables.is_eu_member(state) => issues.push(ValidationIssue::error(
            IssueKind::InvalidFormat,
            "member_state",
            format!("{state} is not an EU member state"),
        )),
        Some(_) => {}
    }

    if let Some(deadline) = deadline {
        let days_left = (deadline - as_of).num_days();
        if days_left < 0 {
            issues.push(
                ValidationIssue::error(
                    IssueKind::RegulatoryRuleViolation,
                    "deadline",
                    format!("submission deadline {deadline} has passed"),
                )
                .cite(citation::REPORTING),
            );
        } else if days_left <= DEADLINE_WARNING_DAYS {
            issues.push(
                ValidationIssue::warning(
                    IssueKind::RegulatoryRuleViolation,
                    "deadline",
                    format!("submission deadline {deadline} is in {days_left} days"),
                )
                .cite(citation::REPORTING),
            );
        }
    }

    (issues, deadline)
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn aggregate(
    tables: &ReferenceTables,
    report: &SubmissionReport,
    entries: Vec<EntryReadiness>,
    as_of: NaiveDate,
) -> SubmissionReadiness {
    let mut blocking_reasons = Vec::new();
    let mut warnings = Vec::new();
    let mut file = |scope: &str, issue: ValidationIssue| {
        let item = BatchIssue {
            scope: scope.to_string(),
            issue,
        };
        if item.issue.is_error() {
            blocking_reasons.push(item);
        } else {
            warnings.push(item);
        }
    };

    let (metadata_issues, deadline) = check_metadata(tables, report, as_of);
    let metadata_errors = metadata_issues.iter().filter(|issue| issue.is_error()).count();
    for issue in metadata_issues {
        file(REPORT_SCOPE, issue);
    }
    if entries.is_empty() {
        file(
            REPORT_SCOPE,
            ValidationIssue::error(
                IssueKind::MissingRequiredField,
                "entries",
                "submission contains no entries",
            ),
        );
    }

    for entry in &entries {
        for issue in entry.validation.issues.iter().chain(&entry.findings) {
            file(&entry.reference, issue.clone());
        }
    }

    let materiality = summarize_materiality(
        entries
            .iter()
            .map(|entry| EntryMateriality {
                reference: entry.reference.clone(),
                cn_code: entry.cn_code.clone(),
                assessment: entry.materiality.clone(),
            })
            .collect(),
    );
    for code in &materiality.high_risk_codes {
        file(
            REPORT_SCOPE,
            ValidationIssue::warning(
                IssueKind::OutOfRange,
                "cn_code",
                format!("more than 30% of entries for CN code {code} are material"),
            )
            .cite(citation::VERIFICATION),
        );
    }

    let required: u64 = entries
        .iter()
        .filter_map(|entry| entry.certificates_required)
        .sum();
    let certificates = CertificateBalance::new(required, report.certificates_surrendered);
    if !certificates.is_sufficient() {
        file(
            REPORT_SCOPE,
            ValidationIssue::error(
                IssueKind::RegulatoryRuleViolation,
                "certificates_surrendered",
                format!(
                    "{} certificates required, {} surrendered: shortfall of {}",
                    certificates.required, certificates.surrendered, certificates.shortfall
                ),
            )
            .cite(citation::FREE_ALLOCATION),
        );
    }

    let requiring: Vec<&EntryReadiness> = entries
        .iter()
        .filter(|entry| entry.requires_verification)
        .collect();
    let verification = VerificationCoverage {
        requiring_verification: requiring.len(),
        verified: requiring.iter().filter(|entry| entry.verified).count(),
        unverified: requiring
            .iter()
            .filter(|entry| !entry.verified)
            .map(|entry| entry.reference.clone())
            .collect(),
    };

    let total = entries.len();
    let scores = ReadinessScores {
        metadata: percent(METADATA_CHECKS - metadata_errors.min(METADATA_CHECKS), METADATA_CHECKS),
        entry_compliance_rate: percent(
            entries.iter().filter(|entry| entry.validation.valid).count(),
            total,
        ),
        eori_pass_rate: percent(
            entries
                .iter()
                .filter(|entry| entry.eori.as_ref().map_or(false, |eori| eori.valid))
                .count(),
            total,
        ),
        average_data_quality: if total == 0 {
            0.0
        } else {
            entries
                .iter()
                .map(|entry| entry.data_quality.composite)
                .sum::<f64>()
                / total as f64
        },
        certificate_sufficiency: if certificates.required == 0 {
            100.0
        } else {
            (certificates.surrendered as f64 / certificates.required as f64).min(1.0) * 100.0
        },
        verification_rate: if verification.requiring_verification == 0 {
            100.0
        } else {
            percent(verification.verified, verification.requiring_verification)
        },
    };

    let readiness_score = scores.blended();
    let can_submit = blocking_reasons.is_empty();
    let ready_for_submission = can_submit && readiness_score >= READY_READINESS_SCORE;

    tracing::info!(
        year = report.reporting_year,
        quarter = report.reporting_quarter,
        entries = total,
        readiness_score,
        can_submit,
        blocking = blocking_reasons.len(),
        "assessed submission readiness"
    );

    SubmissionReadiness {
        reporting_year: report.reporting_year,
        reporting_quarter: report.reporting_quarter,
        deadline,
        assessed_on: as_of,
        entry_count: total,
        entries,
        high_risk_codes: materiality.high_risk_codes,
        certificates,
        verification,
        scores,
        readiness_score,
        can_submit,
        ready_for_submission,
        blocking_reasons,
        warnings,
    }
}
