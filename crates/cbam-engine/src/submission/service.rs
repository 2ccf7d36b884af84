use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{SubmissionReadiness, SubmissionReport};
use super::orchestrator::{validate_for_submission_concurrent, SubmissionError};
use crate::calculation::{
    apply_default_markup, calculate_chargeable_emissions, calculate_free_allocation,
    compute_entry_certificates, project_phase_out, resolve_benchmark, suggest_route,
    BenchmarkError, CalculationError, ChargeableEmissions, DefaultMarkup, EntryCertificates,
    FreeAllocation, ProjectionRequest, ProjectionYear, ResolvedBenchmark, RouteSuggestion,
};
use crate::entries::EmissionEntry;
use crate::reference::{GoodsCategory, ReferenceTables, REGIME_START_YEAR};
use crate::validation::{
    assess_materiality_batch, score_data_quality, validate_entry,
    DataQualityScore, EoriBatchReport, EoriResult, EoriValidator, MaterialityReport,
    ValidationResult,
};

#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkQuery {
    pub cn_code: String,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub country_of_origin: Option<String>,
    #[serde(default)]
    pub product_description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkView {
    pub benchmark: ResolvedBenchmark,
    /// Advisory only; never applied to the resolved benchmark.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_route: Option<RouteSuggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_markup: Option<DefaultMarkup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteSuggestionView {
    pub cn_code: String,
    pub category: GoodsCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<RouteSuggestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryCertificatesView {
    pub certificates: EntryCertificates,
    /// Entry carrying the computed adjustment fields.
    pub entry: EmissionEntry,
}

/// Front door to the engine for one edition of the reference tables.
pub struct ComplianceService {
    tables: Arc<ReferenceTables>,
    certificate_price_eur: f64,
}

impl ComplianceService {
    pub fn new(tables: Arc<ReferenceTables>, certificate_price_eur: f64) -> Self {
        Self {
            tables,
            certificate_price_eur,
        }
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    pub fn certificate_price_eur(&self) -> f64 {
        self.certificate_price_eur
    }

    pub fn resolve(&self, query: &BenchmarkQuery) -> Result<BenchmarkView, BenchmarkError> {
        let year = query.year.unwrap_or(REGIME_START_YEAR);
        let benchmark = resolve_benchmark(&self.tables, &query.cn_code, query.route.as_deref(), year)?;
        let suggested_route = suggest_route(
            &self.tables,
            benchmark.category,
            query.product_description.as_deref(),
            query.country_of_origin.as_deref(),
        )
        .filter(|suggestion| suggestion.route != benchmark.route);
        let default_markup = query
            .country_of_origin
            .as_deref()
            .map(|country| apply_default_markup(&self.tables, benchmark.value, country));

        Ok(BenchmarkView {
            benchmark,
            suggested_route,
            default_markup,
        })
    }

    pub fn suggest(&self, query: &BenchmarkQuery) -> Result<RouteSuggestionView, BenchmarkError> {
        let cn_code = query.cn_code.trim().to_string();
        let category = self
            .tables
            .classify(&cn_code)
            .ok_or_else(|| BenchmarkError::UnclassifiedGood {
                cn_code: cn_code.clone(),
            })?;
        let suggestion = suggest_route(
            &self.tables,
            category,
            query.product_description.as_deref(),
            query.country_of_origin.as_deref(),
        );
        Ok(RouteSuggestionView {
            cn_code,
            category,
            suggestion,
        })
    }

    pub fn free_allocation(
        &self,
        benchmark_value: f64,
        quantity: f64,
        year: i32,
    ) -> Result<FreeAllocation, CalculationError> {
        calculate_free_allocation(&self.tables, benchmark_value, quantity, year)
    }

    pub fn chargeable(
        &self,
        total_embedded: f64,
        free_allocation_adjustment: f64,
        foreign_carbon_price_deduction: f64,
    ) -> Result<ChargeableEmissions, CalculationError> {
        calculate_chargeable_emissions(
            total_embedded,
            free_allocation_adjustment,
            foreign_carbon_price_deduction,
        )
    }

    /// Projection priced at the configured certificate price unless the request names one.
    pub fn project(&self, request: &ProjectionRequest) -> Result<Vec<ProjectionYear>, CalculationError> {
        let mut request = request.clone();
        request.certificate_price_eur = request
            .certificate_price_eur
            .or(Some(self.certificate_price_eur));
        project_phase_out(&self.tables, &request)
    }

    pub fn validate_entry(&self, entry: &EmissionEntry) -> ValidationResult {
        validate_entry(&self.tables, entry)
    }

    pub fn entry_certificates(
        &self,
        entry: &EmissionEntry,
    ) -> Result<EntryCertificatesView, CalculationError> {
        let certificates = compute_entry_certificates(&self.tables, entry)?;
        let entry = entry.with_adjustments(&certificates);
        Ok(EntryCertificatesView {
            certificates,
            entry,
        })
    }

    pub fn data_quality(&self, entry: &EmissionEntry, as_of: Option<NaiveDate>) -> DataQualityScore {
        score_data_quality(entry, as_of.unwrap_or_else(today))
    }

    pub fn materiality(&self, entries: &[EmissionEntry]) -> MaterialityReport {
        assess_materiality_batch(entries)
    }

    pub fn eori(&self, identifier: &str, member_state: Option<&str>, strict: bool) -> EoriResult {
        let validator = EoriValidator {
            enforce_checksum: strict,
        };
        match member_state {
            Some(state) => validator.validate_for_member_state(&self.tables, identifier, state),
            None => validator.validate(&self.tables, identifier),
        }
    }

    pub fn eori_batch(
        &self,
        identifiers: &[String],
        member_state: Option<&str>,
        strict: bool,
    ) -> EoriBatchReport {
        let validator = EoriValidator {
            enforce_checksum: strict,
        };
        validator.validate_batch(&self.tables, identifiers, member_state)
    }

    pub async fn readiness(
        &self,
        report: SubmissionReport,
        entries: Vec<EmissionEntry>,
        as_of: Option<NaiveDate>,
    ) -> Result<SubmissionReadiness, SubmissionError> {
        validate_for_submission_concurrent(
            Arc::clone(&self.tables),
            report,
            entries,
            as_of.unwrap_or_else(today),
        )
        .await
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
