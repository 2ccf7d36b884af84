use serde::{Deserialize, Serialize};

use super::benchmark::{resolve_benchmark, ResolvedBenchmark};
use super::{non_negative, CalculationError};
use crate::entries::{present, EmissionEntry};
use crate::reference::{ReferenceTables, REGIME_START_YEAR};

/// Longest span accepted by [`project_phase_out`].
pub const MAX_PROJECTION_YEARS: i32 = 50;

const WHOLE_TONNE_TOLERANCE: f64 = 1e-9;

/// Free allocation granted against the benchmark emissions of a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeAllocation {
    pub year: i32,
    pub cbam_factor: f64,
    pub free_allocation_percent: f64,
    pub total_benchmark_emissions: f64,
    /// tCO2e deducted from embedded emissions.
    pub adjustment: f64,
}

/// Deducts the year's free allocation from the *benchmark* emissions of `quantity`.
pub fn calculate_free_allocation(
    tables: &ReferenceTables,
    benchmark_value: f64,
    quantity: f64,
    year: i32,
) -> Result<FreeAllocation, CalculationError> {
    let benchmark_value = non_negative("benchmark_value", benchmark_value)?;
    let quantity = non_negative("quantity", quantity)?;

    let cbam_factor = tables.cbam_factor(year);
    let total_benchmark_emissions = benchmark_value * quantity;
    let allocation = FreeAllocation {
        year,
        cbam_factor,
        free_allocation_percent: (1.0 - cbam_factor) * 100.0,
        total_benchmark_emissions,
        adjustment: total_benchmark_emissions * (1.0 - cbam_factor),
    };

    tracing::debug!(
        year,
        cbam_factor,
        adjustment = allocation.adjustment,
        "calculated free allocation"
    );
    Ok(allocation)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeableBreakdown {
    pub total_embedded_emissions: f64,
    pub free_allocation_adjustment: f64,
    pub foreign_carbon_price_deduction: f64,
    /// Deductions exceeded the embedded emissions and the result was floored at zero.
    pub floored_at_zero: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeableEmissions {
    pub chargeable: f64,
    pub certificates_required: u64,
    pub breakdown: ChargeableBreakdown,
}

/// Embedded emissions less free allocation, then less the foreign carbon price deduction,
/// floored at zero. One certificate per started tonne.
pub fn calculate_chargeable_emissions(
    total_embedded: f64,
    free_allocation_adjustment: f64,
    foreign_carbon_price_deduction: f64,
) -> Result<ChargeableEmissions, CalculationError> {
    let total_embedded = non_negative("total_embedded_emissions", total_embedded)?;
    let adjustment = non_negative("free_allocation_adjustment", free_allocation_adjustment)?;
    let foreign = non_negative(
        "foreign_carbon_price_deduction",
        foreign_carbon_price_deduction,
    )?;

    let remaining = total_embedded - adjustment - foreign;
    let chargeable = remaining.max(0.0);
    let certificates_required = certificates_for(chargeable);

    Ok(ChargeableEmissions {
        chargeable,
        certificates_required,
        breakdown: ChargeableBreakdown {
            total_embedded_emissions: total_embedded,
            free_allocation_adjustment: adjustment,
            foreign_carbon_price_deduction: foreign,
            floored_at_zero: remaining < 0.0,
        },
    })
}

/// Whole tonnes owed for a chargeable amount, always rounded up. Amounts within a relative
/// 1e-9 of a whole tonne count as that tonne.
fn certificates_for(chargeable: f64) -> u64 {
    let nearest = chargeable.round();
    if (chargeable - nearest).abs() <= WHOLE_TONNE_TOLERANCE * nearest.max(1.0) {
        nearest as u64
    } else {
        chargeable.ceil() as u64
    }
}

/// Inputs for a multi-year certificate forecast of a constant import profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRequest {
    pub benchmark_value: f64,
    pub quantity: f64,
    pub total_embedded_emissions: f64,
    #[serde(default)]
    pub foreign_carbon_price_deduction: f64,
    pub start_year: i32,
    pub end_year: i32,
    #[serde(default)]
    pub certificate_price_eur: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionYear {
    pub year: i32,
    pub cbam_factor: f64,
    pub free_allocation_adjustment: f64,
    pub chargeable_emissions: f64,
    pub certificates_required: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost_eur: Option<f64>,
}

/// Computes each year of the range independently from the same quantity and benchmark.
pub fn project_phase_out(
    tables: &ReferenceTables,
    request: &ProjectionRequest,
) -> Result<Vec<ProjectionYear>, CalculationError> {
    let (start, end) = (request.start_year, request.end_year);
    if start > end || i64::from(end) - i64::from(start) >= i64::from(MAX_PROJECTION_YEARS) {
        return Err(CalculationError::InvalidYearRange { start, end });
    }
    let price = request
        .certificate_price_eur
        .map(|price| non_negative("certificate_price_eur", price))
        .transpose()?;

    (start..=end)
        .map(|year| {
            let allocation =
                calculate_free_allocation(tables, request.benchmark_value, request.quantity, year)?;
            let chargeable = calculate_chargeable_emissions(
                request.total_embedded_emissions,
                allocation.adjustment,
                request.foreign_carbon_price_deduction,
            )?;
            Ok(ProjectionYear {
                year,
                cbam_factor: allocation.cbam_factor,
                free_allocation_adjustment: allocation.adjustment,
                chargeable_emissions: chargeable.chargeable,
                certificates_required: chargeable.certificates_required,
                estimated_cost_eur: price
                    .map(|price| chargeable.certificates_required as f64 * price),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddedEmissionsSource {
    Declared,
    Computed,
}

/// Full certificate derivation for one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryCertificates {
    pub benchmark: ResolvedBenchmark,
    pub allocation: FreeAllocation,
    pub chargeable: ChargeableEmissions,
    /// Total stored on the entry, if any.
    pub declared_total: Option<f64>,
    /// quantity × direct intensity, if both are present.
    pub computed_total: Option<f64>,
    pub embedded_source: EmbeddedEmissionsSource,
}

/// Chains benchmark resolution, free allocation and chargeable emissions for an entry.
///
/// The declared total is used when present; otherwise quantity × direct intensity. Both figures
/// are kept on the result.
pub fn compute_entry_certificates(
    tables: &ReferenceTables,
    entry: &EmissionEntry,
) -> Result<EntryCertificates, CalculationError> {
    let cn_code =
        present(&entry.cn_code).ok_or(CalculationError::MissingInput { field: "cn_code" })?;
    let quantity = entry
        .quantity
        .ok_or(CalculationError::MissingInput { field: "quantity" })?;
    let year = entry.reporting_year.unwrap_or(REGIME_START_YEAR);

    let benchmark = resolve_benchmark(
        tables,
        cn_code,
        present(&entry.production_route),
        year,
    )?;
    let allocation = calculate_free_allocation(tables, benchmark.value, quantity, year)?;

    let declared_total = entry.total_embedded_emissions;
    let computed_total = entry
        .direct_emissions_specific
        .map(|intensity| quantity * intensity);
    let (total, embedded_source) = match (declared_total, computed_total) {
        (Some(total), _) => (total, EmbeddedEmissionsSource::Declared),
        (None, Some(total)) => (total, EmbeddedEmissionsSource::Computed),
        (None, None) => {
            return Err(CalculationError::MissingInput {
                field: "direct_emissions_specific",
            })
        }
    };

    let chargeable = calculate_chargeable_emissions(
        total,
        allocation.adjustment,
        entry.foreign_carbon_price_deduction.unwrap_or(0.0),
    )?;

    Ok(EntryCertificates {
        benchmark,
        allocation,
        chargeable,
        declared_total,
        computed_total,
        embedded_source,
    })
}
