use cbam_engine::{
    CalculationMethod, EntryImportError, EntryImporter, FunctionalUnit, VerificationStatus,
};
use chrono::NaiveDate;
use std::io::Write;

const FIXTURE: &[u8] = include_bytes!("fixtures/q1_2026_entries.csv");

#[test]
fn csv_fixture_imports_every_row() {
    let entries = EntryImporter::from_csv_reader(FIXTURE).expect("fixture imports");
    assert_eq!(entries.len(), 3);

    let steel = &entries[0];
    assert_eq!(steel.id.as_deref(), Some("imp-101"));
    assert_eq!(steel.calculation_method, Some(CalculationMethod::EuMethod));
    assert_eq!(
        steel.verification_status,
        VerificationStatus::AccreditedSatisfactory
    );
    assert_eq!(steel.parsed_unit(), Some(FunctionalUnit::Tonnes));
    assert_eq!(steel.total_embedded_emissions, None);
    assert_eq!(
        steel.import_date,
        Some(NaiveDate::from_ymd_opt(2026, 2, 3).expect("valid date"))
    );

    let aluminium = &entries[1];
    assert!(aluminium.uses_default_values);
    assert_eq!(aluminium.installation_id, None);
    assert_eq!(aluminium.verification_status, VerificationStatus::NotVerified);

    let cement = &entries[2];
    assert!(cement.has_carbon_price());
    assert_eq!(cement.foreign_carbon_price_deduction, Some(12.0));
}

#[test]
fn from_path_picks_the_format_from_the_extension() {
    let dir = std::env::temp_dir().join(format!("cbam-entry-import-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");

    let csv_path = dir.join("entries.CSV");
    std::fs::write(&csv_path, FIXTURE).expect("write csv");
    let from_csv = EntryImporter::from_path(&csv_path).expect("csv imports");

    let json_path = dir.join("entries.json");
    let mut file = std::fs::File::create(&json_path).expect("create json");
    serde_json::to_writer(&mut file, &from_csv).expect("serialize entries");
    file.flush().expect("flush json");
    let from_json = EntryImporter::from_path(&json_path).expect("json imports");

    assert_eq!(from_csv, from_json);

    let err = EntryImporter::from_path(dir.join("entries.xlsx")).expect_err("xlsx unsupported");
    assert!(matches!(err, EntryImportError::UnsupportedFormat(ext) if ext == "xlsx"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn unknown_calculation_method_is_a_csv_error() {
    let csv = "id,cn_code,calculation_method\nimp-1,72083900,guesswork\n";
    let err = EntryImporter::from_csv_reader(csv.as_bytes()).expect_err("unknown method");
    assert!(matches!(err, EntryImportError::Csv(_)));
}
