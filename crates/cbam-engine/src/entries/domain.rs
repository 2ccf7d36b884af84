use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calculation::EntryCertificates;

/// Unit an entry's quantity is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionalUnit {
    #[serde(rename = "tonnes")]
    Tonnes,
    #[serde(rename = "MWh")]
    MegawattHours,
    #[serde(rename = "kg-nitrogen")]
    KilogramsNitrogen,
    #[serde(rename = "tonnes-clinker")]
    TonnesClinker,
}

impl FunctionalUnit {
    pub const ALL: [FunctionalUnit; 4] = [
        FunctionalUnit::Tonnes,
        FunctionalUnit::MegawattHours,
        FunctionalUnit::KilogramsNitrogen,
        FunctionalUnit::TonnesClinker,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            FunctionalUnit::Tonnes => "tonnes",
            FunctionalUnit::MegawattHours => "MWh",
            FunctionalUnit::KilogramsNitrogen => "kg-nitrogen",
            FunctionalUnit::TonnesClinker => "tonnes-clinker",
        }
    }

    /// Parses a declared unit, ignoring case and treating `_`/space like `-`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw
            .trim()
            .to_ascii_lowercase()
            .replace('_', "-")
            .replace(' ', "-");
        Self::ALL
            .into_iter()
            .find(|unit| unit.label().to_ascii_lowercase() == normalized)
    }
}

/// Emission determination method declared for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalculationMethod {
    #[serde(rename = "Default_values")]
    DefaultValues,
    #[serde(rename = "EU_method")]
    EuMethod,
    #[serde(rename = "Equivalent_method_A")]
    EquivalentMethodA,
    #[serde(rename = "Equivalent_method_B")]
    EquivalentMethodB,
    /// Legacy tag for installation-specific actual values.
    #[serde(rename = "actual_values")]
    ActualValues,
}

impl CalculationMethod {
    pub const fn label(self) -> &'static str {
        match self {
            CalculationMethod::DefaultValues => "Default_values",
            CalculationMethod::EuMethod => "EU_method",
            CalculationMethod::EquivalentMethodA => "Equivalent_method_A",
            CalculationMethod::EquivalentMethodB => "Equivalent_method_B",
            CalculationMethod::ActualValues => "actual_values",
        }
    }

    /// Methods built on installation-level monitoring rather than published defaults.
    pub const fn uses_actual_values(self) -> bool {
        matches!(
            self,
            CalculationMethod::EuMethod | CalculationMethod::ActualValues
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    NotVerified,
    Pending,
    AccreditedSatisfactory,
    AccreditedUnsatisfactory,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VerificationStatus::NotVerified => "not_verified",
            VerificationStatus::Pending => "pending",
            VerificationStatus::AccreditedSatisfactory => "accredited_satisfactory",
            VerificationStatus::AccreditedUnsatisfactory => "accredited_unsatisfactory",
        }
    }
}

/// One declared import line as supplied by the entry store.
///
/// Every field is optional so incomplete drafts can still be validated and scored. The
/// free-allocation fields are outputs of the engine and are never trusted as input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionEntry {
    pub id: Option<String>,
    pub cn_code: Option<String>,
    pub product_description: Option<String>,
    pub country_of_origin: Option<String>,
    pub quantity: Option<f64>,
    pub functional_unit: Option<String>,
    /// tCO2e per functional unit.
    pub direct_emissions_specific: Option<f64>,
    pub indirect_emissions_specific: Option<f64>,
    /// Declared total in tCO2e, kept alongside the figure derived from quantity × intensity.
    pub total_embedded_emissions: Option<f64>,
    pub calculation_method: Option<CalculationMethod>,
    pub reporting_year: Option<i32>,
    pub production_route: Option<String>,
    pub installation_id: Option<String>,
    pub monitoring_plan_ref: Option<String>,
    pub operator_report_ref: Option<String>,
    pub declarant_eori: Option<String>,
    /// Carbon price paid in the country of origin (EUR).
    pub carbon_price_paid: Option<f64>,
    pub carbon_price_proof: Option<String>,
    /// tCO2e deductible for the carbon price already paid abroad.
    pub foreign_carbon_price_deduction: Option<f64>,
    pub verification_status: VerificationStatus,
    pub document_language: Option<String>,
    pub customs_declaration_ref: Option<String>,
    pub uses_default_values: bool,
    pub default_value_markup_percent: Option<f64>,
    pub free_allocation_percent: Option<f64>,
    pub free_allocation_adjustment: Option<f64>,
    pub certificates_required: Option<u64>,
    pub import_date: Option<NaiveDate>,
    pub created_at: Option<NaiveDate>,
}

impl EmissionEntry {
    /// Human-readable reference used in batch reports.
    pub fn reference(&self, position: usize) -> String {
        match (present(&self.id), present(&self.cn_code)) {
            (Some(id), _) => id.to_string(),
            (None, Some(code)) => format!("entry #{} ({code})", position + 1),
            (None, None) => format!("entry #{}", position + 1),
        }
    }

    pub fn normalized_cn_code(&self) -> Option<&str> {
        present(&self.cn_code)
    }

    pub fn parsed_unit(&self) -> Option<FunctionalUnit> {
        present(&self.functional_unit).and_then(FunctionalUnit::parse)
    }

    pub fn has_carbon_price(&self) -> bool {
        self.carbon_price_paid.map_or(false, |amount| amount > 0.0)
    }

    /// Copy of the entry carrying the computed adjustment fields, ready for the caller to persist.
    pub fn with_adjustments(&self, certificates: &EntryCertificates) -> EmissionEntry {
        let mut updated = self.clone();
        updated.free_allocation_percent = Some(certificates.allocation.free_allocation_percent);
        updated.free_allocation_adjustment = Some(certificates.allocation.adjustment);
        updated.certificates_required = Some(certificates.chargeable.certificates_required);
        updated
    }
}

/// Trimmed, non-empty view of an optional text field.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
