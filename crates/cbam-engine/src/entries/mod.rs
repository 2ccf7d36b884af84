//! Declared import lines and the loaders that read them from exports.

mod domain;
mod import;

pub(crate) use domain::present;
pub use domain::{CalculationMethod, EmissionEntry, FunctionalUnit, VerificationStatus};
pub use import::{EntryImportError, EntryImporter};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn csv_import_treats_blank_cells_as_absent() {
        let csv = "id,cn_code,country_of_origin,quantity,functional_unit,direct_emissions_specific,calculation_method,reporting_year,production_route,uses_default_values,verification_status,import_date\n\
imp-1,72083000,CN,100,tonnes,1.2,Default_values,2026,bf_bof_route,true,pending,2026-02-10\n\
imp-2, 76011000 ,NO,,tonnes,,,2026,,,,\n";
        let entries = EntryImporter::from_csv_reader(Cursor::new(csv)).expect("import succeeds");
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.id.as_deref(), Some("imp-1"));
        assert_eq!(first.quantity, Some(100.0));
        assert_eq!(
            first.calculation_method,
            Some(CalculationMethod::DefaultValues)
        );
        assert!(first.uses_default_values);
        assert_eq!(first.verification_status, VerificationStatus::Pending);
        assert_eq!(
            first.import_date,
            chrono::NaiveDate::from_ymd_opt(2026, 2, 10)
        );

        let second = &entries[1];
        assert_eq!(second.cn_code.as_deref(), Some("76011000"));
        assert_eq!(second.quantity, None);
        assert_eq!(second.calculation_method, None);
        assert_eq!(second.production_route, None);
        assert!(!second.uses_default_values);
        assert_eq!(second.verification_status, VerificationStatus::NotVerified);
    }

    #[test]
    fn csv_import_ignores_unknown_columns() {
        let csv = "cn_code,dashboard_color\n72083000,red\n";
        let entries = EntryImporter::from_csv_reader(Cursor::new(csv)).expect("import succeeds");
        assert_eq!(entries[0].normalized_cn_code(), Some("72083000"));
    }

    #[test]
    fn csv_import_reports_malformed_numbers() {
        let csv = "cn_code,quantity\n72083000,lots\n";
        let error = EntryImporter::from_csv_reader(Cursor::new(csv)).expect_err("bad quantity");
        assert!(matches!(error, EntryImportError::Csv(_)));
    }

    #[test]
    fn json_import_accepts_an_array_of_entries() {
        let json = r#"[{"cn_code": "25231000", "quantity": 40, "functional_unit": "tonnes-clinker"}]"#;
        let entries =
            EntryImporter::from_json_reader(Cursor::new(json)).expect("import succeeds");
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].parsed_unit(),
            Some(FunctionalUnit::TonnesClinker)
        );
    }

    #[test]
    fn from_path_rejects_unknown_extensions_and_missing_files() {
        let error = EntryImporter::from_path("./entries.xlsx").expect_err("unsupported");
        assert!(matches!(error, EntryImportError::UnsupportedFormat(_)));

        let error = EntryImporter::from_path("./does-not-exist.csv").expect_err("missing");
        assert!(matches!(error, EntryImportError::Io(_)));
    }
}
