use crate::infra::parse_date;
use cbam_engine::config::AppConfig;
use cbam_engine::error::AppError;
use cbam_engine::{
    CalculationMethod, ComplianceService, EmissionEntry, EntryImporter, SubmissionReadiness,
    SubmissionReport, VerificationStatus,
};
use chrono::{NaiveDate, Utc};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Reporting year of the quarterly report
    #[arg(long, default_value_t = 2026)]
    pub(crate) year: i32,
    /// Reporting quarter (1-4)
    #[arg(long, default_value_t = 1)]
    pub(crate) quarter: u8,
    /// Assessment date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// CSV or JSON export of entries to assess instead of the built-in sample batch
    #[arg(long)]
    pub(crate) entries: Option<PathBuf>,
    /// Declarant EORI number
    #[arg(long, default_value = "NL123456789012")]
    pub(crate) declarant: String,
    /// Member state of the declarant
    #[arg(long, default_value = "NL")]
    pub(crate) member_state: String,
    /// Certificates already surrendered for the period
    #[arg(long, default_value_t = 0)]
    pub(crate) surrendered: u64,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        year,
        quarter,
        as_of,
        entries,
        declarant,
        member_state,
        surrendered,
    } = args;

    let config = AppConfig::load()?;
    let tables = Arc::new(config.engine.reference_tables()?);
    let service = ComplianceService::new(tables, config.engine.certificate_price_eur);

    let (entries, imported) = match entries {
        Some(path) => (EntryImporter::from_path(path)?, true),
        None => (sample_batch(year), false),
    };
    let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());

    let report = SubmissionReport {
        reporting_year: year,
        reporting_quarter: quarter,
        declarant_eori: Some(declarant),
        member_state: Some(member_state),
        certificates_surrendered: surrendered,
    };

    println!("CBAM submission readiness demo");
    if imported {
        println!("Data source: imported entry file");
    } else {
        println!("Data source: built-in sample batch");
    }
    let readiness = service.readiness(report, entries, Some(as_of)).await?;
    render_readiness(&readiness, service.certificate_price_eur());
    Ok(())
}

fn render_readiness(readiness: &SubmissionReadiness, certificate_price_eur: f64) {
    println!(
        "Period: {} Q{} (deadline {}, assessed {})",
        readiness.reporting_year,
        readiness.reporting_quarter,
        readiness
            .deadline
            .map(|date| date.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        readiness.assessed_on
    );

    println!("\nEntries ({})", readiness.entry_count);
    for entry in &readiness.entries {
        println!(
            "  - {} [{}]: {} error(s), {} warning(s), quality {:.1} ({}), certificates {}",
            entry.reference,
            entry.cn_code.as_deref().unwrap_or("no CN code"),
            entry.validation.error_count,
            entry.validation.warning_count,
            entry.data_quality.composite,
            entry.data_quality.rating.label(),
            entry
                .certificates_required
                .map(|count| count.to_string())
                .unwrap_or_else(|| "n/a".to_string())
        );
    }

    let certificates = &readiness.certificates;
    println!(
        "\nCertificates: {} required, {} surrendered, shortfall {} (~EUR {:.2})",
        certificates.required,
        certificates.surrendered,
        certificates.shortfall,
        certificates.shortfall as f64 * certificate_price_eur
    );
    println!(
        "Verification: {}/{} entries verified",
        readiness.verification.verified, readiness.verification.requiring_verification
    );
    if !readiness.high_risk_codes.is_empty() {
        println!("High-risk CN codes: {}", readiness.high_risk_codes.join(", "));
    }

    let scores = &readiness.scores;
    println!("\nScores");
    println!("  Metadata: {:.1}", scores.metadata);
    println!("  Entry compliance: {:.1}", scores.entry_compliance_rate);
    println!("  EORI pass rate: {:.1}", scores.eori_pass_rate);
    println!("  Data quality: {:.1}", scores.average_data_quality);
    println!("  Certificate sufficiency: {:.1}", scores.certificate_sufficiency);
    println!("  Verification: {:.1}", scores.verification_rate);
    println!(
        "Readiness score {:.1} (can submit: {}, ready: {})",
        readiness.readiness_score, readiness.can_submit, readiness.ready_for_submission
    );

    if readiness.blocking_reasons.is_empty() {
        println!("\nBlocking issues: none");
    } else {
        println!("\nBlocking issues");
        for blocker in &readiness.blocking_reasons {
            println!("  - {}: {}", blocker.scope, blocker.issue.message);
        }
    }
    if !readiness.warnings.is_empty() {
        println!("\nWarnings");
        for warning in &readiness.warnings {
            println!("  - {}: {}", warning.scope, warning.issue.message);
        }
    }
}

fn sample_batch(year: i32) -> Vec<EmissionEntry> {
    let import_date = NaiveDate::from_ymd_opt(year, 2, 14);
    let verified_steel = EmissionEntry {
        id: Some("demo-steel".to_string()),
        cn_code: Some("72083900".to_string()),
        product_description: Some("Hot-rolled coil, DRI-EAF".to_string()),
        country_of_origin: Some("TR".to_string()),
        quantity: Some(250.0),
        functional_unit: Some("tonnes".to_string()),
        direct_emissions_specific: Some(1.05),
        indirect_emissions_specific: Some(0.12),
        calculation_method: Some(CalculationMethod::EuMethod),
        reporting_year: Some(year),
        production_route: Some("dri_eaf_route".to_string()),
        installation_id: Some("TR-INST-0042".to_string()),
        monitoring_plan_ref: Some("MP-2026-0042".to_string()),
        operator_report_ref: Some("OR-2026-0042".to_string()),
        declarant_eori: Some("NL123456789012".to_string()),
        verification_status: VerificationStatus::AccreditedSatisfactory,
        document_language: Some("en".to_string()),
        customs_declaration_ref: Some("MRN26NL000000001".to_string()),
        import_date,
        ..EmissionEntry::default()
    };

    let default_aluminium = EmissionEntry {
        id: Some("demo-aluminium".to_string()),
        cn_code: Some("76012000".to_string()),
        product_description: Some("Unwrought aluminium alloy".to_string()),
        country_of_origin: Some("CN".to_string()),
        quantity: Some(40.0),
        functional_unit: Some("tonnes".to_string()),
        direct_emissions_specific: Some(1.9),
        calculation_method: Some(CalculationMethod::DefaultValues),
        production_route: Some("primary_smelting".to_string()),
        uses_default_values: true,
        reporting_year: Some(year),
        declarant_eori: Some("NL123456789012".to_string()),
        customs_declaration_ref: Some("MRN26NL000000002".to_string()),
        import_date,
        ..EmissionEntry::default()
    };

    let priced_cement = EmissionEntry {
        id: Some("demo-cement".to_string()),
        cn_code: Some("25232900".to_string()),
        product_description: Some("Portland cement".to_string()),
        country_of_origin: Some("MA".to_string()),
        quantity: Some(1_000.0),
        functional_unit: Some("tonnes".to_string()),
        direct_emissions_specific: Some(0.79),
        calculation_method: Some(CalculationMethod::EuMethod),
        reporting_year: Some(year),
        production_route: Some("portland_cement".to_string()),
        installation_id: Some("MA-INST-0007".to_string()),
        monitoring_plan_ref: Some("MP-2026-0007".to_string()),
        operator_report_ref: Some("OR-2026-0007".to_string()),
        declarant_eori: Some("NL123456789012".to_string()),
        carbon_price_paid: Some(1_200.0),
        carbon_price_proof: Some("MA-ETS-RECEIPT-7".to_string()),
        foreign_carbon_price_deduction: Some(15.0),
        verification_status: VerificationStatus::Pending,
        document_language: Some("fr".to_string()),
        customs_declaration_ref: Some("MRN26NL000000003".to_string()),
        import_date,
        ..EmissionEntry::default()
    };

    vec![verified_steel, default_aluminium, priced_cement]
}
