use std::sync::Arc;

use axum::response::Response;
use axum::Router;
use chrono::NaiveDate;
use serde_json::Value;

use crate::entries::{CalculationMethod, EmissionEntry, VerificationStatus};
use crate::reference::ReferenceTables;
use crate::submission::{compliance_router, ComplianceService, SubmissionReport};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn tables() -> ReferenceTables {
    ReferenceTables::builtin()
}

/// Twenty days before the Q1 2026 deadline.
pub(super) fn as_of() -> NaiveDate {
    date(2026, 4, 10)
}

pub(super) fn report(certificates_surrendered: u64) -> SubmissionReport {
    SubmissionReport {
        reporting_year: 2026,
        reporting_quarter: 1,
        declarant_eori: Some("NL123456789012".to_string()),
        member_state: Some("NL".to_string()),
        certificates_surrendered,
    }
}

/// Verified actual-values steel import: 100 t at 1.2 tCO2e/t on the DRI route, 74 certificates.
pub(super) fn verified_entry(id: &str) -> EmissionEntry {
    EmissionEntry {
        id: Some(id.to_string()),
        cn_code: Some("72083000".to_string()),
        product_description: Some("Hot-rolled coil".to_string()),
        country_of_origin: Some("TR".to_string()),
        quantity: Some(100.0),
        functional_unit: Some("tonnes".to_string()),
        direct_emissions_specific: Some(1.2),
        indirect_emissions_specific: Some(0.1),
        total_embedded_emissions: Some(120.0),
        calculation_method: Some(CalculationMethod::EuMethod),
        reporting_year: Some(2026),
        production_route: Some("dri_eaf_route".to_string()),
        installation_id: Some("TR-INST-0042".to_string()),
        monitoring_plan_ref: Some("MP-2026-01".to_string()),
        operator_report_ref: Some("OR-2026-Q1".to_string()),
        declarant_eori: Some("NL123456789012".to_string()),
        carbon_price_paid: Some(1500.0),
        carbon_price_proof: Some("TR-ETS-0099".to_string()),
        verification_status: VerificationStatus::AccreditedSatisfactory,
        document_language: Some("en".to_string()),
        customs_declaration_ref: Some("26NL000000000001".to_string()),
        import_date: Some(date(2026, 2, 1)),
        created_at: Some(date(2026, 2, 2)),
        ..EmissionEntry::default()
    }
}

pub(super) const CERTIFICATES_PER_VERIFIED_ENTRY: u64 = 74;

pub(super) fn verified_batch() -> Vec<EmissionEntry> {
    vec![verified_entry("imp-1"), verified_entry("imp-2")]
}

pub(super) fn service() -> Arc<ComplianceService> {
    Arc::new(ComplianceService::new(Arc::new(tables()), 80.0))
}

pub(super) fn router() -> Router {
    compliance_router(service())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
