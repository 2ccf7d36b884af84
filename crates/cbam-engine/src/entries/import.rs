use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use super::domain::{CalculationMethod, EmissionEntry, VerificationStatus};

#[derive(Debug, thiserror::Error)]
pub enum EntryImportError {
    #[error("failed to read entry export: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse CSV entry export: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to parse JSON entry export: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported entry export format: {0}")]
    UnsupportedFormat(String),
}

/// Loads emission entries from the CSV or JSON exports produced by the entry store.
pub struct EntryImporter;

impl EntryImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<EmissionEntry>, EntryImportError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let entries = match extension.as_str() {
            "csv" => Self::from_csv_reader(File::open(path)?)?,
            "json" => Self::from_json_reader(File::open(path)?)?,
            other => return Err(EntryImportError::UnsupportedFormat(other.to_string())),
        };

        tracing::info!(
            path = %path.display(),
            entries = entries.len(),
            "imported emission entries"
        );
        Ok(entries)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Vec<EmissionEntry>, EntryImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = Vec::new();
        for row in csv_reader.deserialize::<EntryRow>() {
            entries.push(row?.into_entry());
        }
        Ok(entries)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Vec<EmissionEntry>, EntryImportError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Flat CSV row; blank cells deserialize to `None`.
#[derive(Debug, Deserialize)]
struct EntryRow {
    id: Option<String>,
    cn_code: Option<String>,
    product_description: Option<String>,
    country_of_origin: Option<String>,
    quantity: Option<f64>,
    functional_unit: Option<String>,
    direct_emissions_specific: Option<f64>,
    indirect_emissions_specific: Option<f64>,
    total_embedded_emissions: Option<f64>,
    calculation_method: Option<CalculationMethod>,
    reporting_year: Option<i32>,
    production_route: Option<String>,
    installation_id: Option<String>,
    monitoring_plan_ref: Option<String>,
    operator_report_ref: Option<String>,
    declarant_eori: Option<String>,
    carbon_price_paid: Option<f64>,
    carbon_price_proof: Option<String>,
    foreign_carbon_price_deduction: Option<f64>,
    verification_status: Option<VerificationStatus>,
    document_language: Option<String>,
    customs_declaration_ref: Option<String>,
    uses_default_values: Option<bool>,
    default_value_markup_percent: Option<f64>,
    import_date: Option<NaiveDate>,
    created_at: Option<NaiveDate>,
}

impl EntryRow {
    fn into_entry(self) -> EmissionEntry {
        EmissionEntry {
            id: self.id,
            cn_code: self.cn_code,
            product_description: self.product_description,
            country_of_origin: self.country_of_origin,
            quantity: self.quantity,
            functional_unit: self.functional_unit,
            direct_emissions_specific: self.direct_emissions_specific,
            indirect_emissions_specific: self.indirect_emissions_specific,
            total_embedded_emissions: self.total_embedded_emissions,
            calculation_method: self.calculation_method,
            reporting_year: self.reporting_year,
            production_route: self.production_route,
            installation_id: self.installation_id,
            monitoring_plan_ref: self.monitoring_plan_ref,
            operator_report_ref: self.operator_report_ref,
            declarant_eori: self.declarant_eori,
            carbon_price_paid: self.carbon_price_paid,
            carbon_price_proof: self.carbon_price_proof,
            foreign_carbon_price_deduction: self.foreign_carbon_price_deduction,
            verification_status: self.verification_status.unwrap_or_default(),
            document_language: self.document_language,
            customs_declaration_ref: self.customs_declaration_ref,
            uses_default_values: self.uses_default_values.unwrap_or(false),
            default_value_markup_percent: self.default_value_markup_percent,
            // Allocation fields are engine outputs and never read back from exports.
            free_allocation_percent: None,
            free_allocation_adjustment: None,
            certificates_required: None,
            import_date: self.import_date,
            created_at: self.created_at,
        }
    }
}
