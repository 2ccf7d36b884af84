use std::sync::Arc;

use super::common::*;
use crate::entries::{CalculationMethod, VerificationStatus};
use crate::submission::{validate_for_submission, validate_for_submission_concurrent};
use crate::validation::IssueKind;

#[test]
fn verified_batch_with_enough_certificates_is_ready() {
    let tables = tables();
    let surrendered = 2 * CERTIFICATES_PER_VERIFIED_ENTRY;
    let readiness = validate_for_submission(&tables, &report(surrendered), &verified_batch(), as_of());

    assert!(readiness.can_submit, "{:?}", readiness.blocking_reasons);
    assert!(readiness.ready_for_submission);
    assert_eq!(readiness.readiness_score, 100.0);
    assert_eq!(readiness.certificates.required, surrendered);
    assert_eq!(readiness.certificates.shortfall, 0);
    assert_eq!(readiness.deadline, Some(date(2026, 4, 30)));
    assert!(readiness.warnings.is_empty(), "{:?}", readiness.warnings);
    assert_eq!(readiness.verification.verified, 2);
}

#[test]
fn certificate_shortfall_blocks_submission() {
    let tables = tables();
    let readiness = validate_for_submission(&tables, &report(100), &verified_batch(), as_of());

    assert!(!readiness.can_submit);
    assert!(!readiness.ready_for_submission);
    assert_eq!(readiness.certificates.shortfall, 48);
    let reason = readiness
        .blocking_reasons
        .iter()
        .find(|reason| reason.issue.field == "certificates_surrendered")
        .expect("shortfall reason");
    assert_eq!(reason.scope, "report");
    assert!(reason.issue.message.contains("shortfall of 48"));
}

#[test]
fn deadline_passed_is_an_error_and_approaching_is_a_warning() {
    let tables = tables();
    let report = report(2 * CERTIFICATES_PER_VERIFIED_ENTRY);

    let late = validate_for_submission(&tables, &report, &verified_batch(), date(2026, 5, 1));
    assert!(!late.can_submit);
    assert!(late
        .blocking_reasons
        .iter()
        .any(|reason| reason.issue.field == "deadline"));

    let close = validate_for_submission(&tables, &report, &verified_batch(), date(2026, 4, 25));
    assert!(close.can_submit);
    assert!(close
        .warnings
        .iter()
        .any(|warning| warning.issue.field == "deadline"));
}

#[test]
fn report_metadata_is_checked() {
    let tables = tables();
    let mut report = report(1000);
    report.reporting_year = 2025;
    report.reporting_quarter = 5;
    report.member_state = None;

    let readiness = validate_for_submission(&tables, &report, &verified_batch(), as_of());
    let fields: Vec<_> = readiness
        .blocking_reasons
        .iter()
        .filter(|reason| reason.scope == "report")
        .map(|reason| reason.issue.field.as_str())
        .collect();
    assert!(fields.contains(&"reporting_year"));
    assert!(fields.contains(&"reporting_quarter"));
    assert!(fields.contains(&"member_state"));
    assert_eq!(readiness.deadline, None);
    assert!((readiness.scores.metadata - 40.0).abs() < 1e-9);
}

#[test]
fn empty_batch_cannot_be_submitted() {
    let tables = tables();
    let readiness = validate_for_submission(&tables, &report(0), &[], as_of());
    assert!(!readiness.can_submit);
    assert_eq!(readiness.entry_count, 0);
    assert!(readiness
        .blocking_reasons
        .iter()
        .any(|reason| reason.issue.field == "entries"));
}

#[test]
fn entry_errors_are_surfaced_with_their_reference() {
    let tables = tables();
    let mut batch = verified_batch();
    batch[1].cn_code = Some("7208300".to_string());

    let readiness = validate_for_submission(&tables, &report(1000), &batch, as_of());
    assert!(!readiness.can_submit);
    let reason = readiness
        .blocking_reasons
        .iter()
        .find(|reason| reason.issue.field == "cn_code")
        .expect("code error");
    assert_eq!(reason.scope, "imp-2");
    assert_eq!(reason.issue.kind, IssueKind::InvalidFormat);
    assert!((readiness.scores.entry_compliance_rate - 50.0).abs() < 1e-9);
}

#[test]
fn eori_from_another_member_state_blocks() {
    let tables = tables();
    let mut report = report(1000);
    report.member_state = Some("DE".to_string());

    let readiness = validate_for_submission(&tables, &report, &verified_batch(), as_of());
    assert!(!readiness.can_submit);
    let eori_errors = readiness
        .blocking_reasons
        .iter()
        .filter(|reason| reason.issue.field == "declarant_eori")
        .count();
    assert_eq!(eori_errors, 2);
    assert_eq!(readiness.scores.eori_pass_rate, 0.0);
}

#[test]
fn unclassified_good_is_a_hard_error() {
    let tables = tables();
    let mut batch = verified_batch();
    batch[0].cn_code = Some("09011100".to_string());

    let readiness = validate_for_submission(&tables, &report(1000), &batch, as_of());
    assert!(readiness
        .blocking_reasons
        .iter()
        .any(|reason| reason.scope == "imp-1" && reason.issue.kind == IssueKind::UnclassifiedGood));
    assert_eq!(readiness.certificates.required, CERTIFICATES_PER_VERIFIED_ENTRY);
}

#[test]
fn warnings_never_block_on_their_own() {
    let tables = tables();
    let mut batch = verified_batch();
    batch[0].customs_declaration_ref = None;
    batch[1].verification_status = VerificationStatus::Pending;

    let readiness = validate_for_submission(&tables, &report(1000), &batch, as_of());
    assert!(readiness.can_submit, "{:?}", readiness.blocking_reasons);
    assert!(readiness
        .warnings
        .iter()
        .any(|warning| warning.issue.field == "customs_declaration_ref"));
    assert_eq!(readiness.verification.unverified, vec!["imp-2".to_string()]);
    assert!((readiness.scores.verification_rate - 50.0).abs() < 1e-9);
    assert!(!readiness.ready_for_submission);
}

#[test]
fn material_outliers_are_reported_as_warnings() {
    let tables = tables();
    let mut batch = vec![
        verified_entry("imp-1"),
        verified_entry("imp-2"),
        verified_entry("imp-3"),
    ];
    batch[2].direct_emissions_specific = Some(1.5);
    batch[2].total_embedded_emissions = Some(150.0);

    let readiness = validate_for_submission(&tables, &report(1000), &batch, as_of());
    assert!(readiness.can_submit);
    assert!(readiness
        .warnings
        .iter()
        .any(|warning| warning.scope == "imp-3" && warning.issue.message.contains("verifier action")));
    assert_eq!(readiness.high_risk_codes, vec!["72083000".to_string()]);
}

#[tokio::test]
async fn concurrent_variant_matches_sequential() {
    let tables = tables();
    let mut batch = verified_batch();
    batch.push(verified_entry("imp-3"));
    batch[2].calculation_method = Some(CalculationMethod::DefaultValues);
    batch[2].production_route = None;
    batch[2].direct_emissions_specific = Some(1.9);

    let sequential = validate_for_submission(&tables, &report(150), &batch, as_of());
    let concurrent =
        validate_for_submission_concurrent(Arc::new(tables), report(150), batch, as_of())
            .await
            .expect("tasks join");

    assert_eq!(sequential, concurrent);
}

#[test]
fn duplicate_ids_still_count_as_peers() {
    let tables = tables();
    let mut batch = vec![
        verified_entry("imp-dup"),
        verified_entry("imp-dup"),
        verified_entry("imp-dup"),
    ];
    batch[2].direct_emissions_specific = Some(1.8);

    let readiness = validate_for_submission(&tables, &report(1000), &batch, as_of());
    let outlier = &readiness.entries[2].materiality;
    assert_eq!(outlier.peer_count, 2);
    assert!(outlier.requires_verifier_action);
}
