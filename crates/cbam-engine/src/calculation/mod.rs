//! Benchmark resolution and the free-allocation arithmetic that turns an entry into a certificate
//! count.

mod allocation;
mod benchmark;
mod route_hint;

pub use allocation::{
    calculate_chargeable_emissions, calculate_free_allocation, compute_entry_certificates,
    project_phase_out, ChargeableBreakdown, ChargeableEmissions, EmbeddedEmissionsSource,
    EntryCertificates, FreeAllocation, ProjectionRequest, ProjectionYear, MAX_PROJECTION_YEARS,
};
pub use benchmark::{
    apply_default_markup, resolve_benchmark, BenchmarkError, DefaultMarkup, ResolvedBenchmark,
    RouteSource,
};
pub use route_hint::{suggest_route, RouteSuggestion};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalculationError {
    #[error("{field} must be a finite number")]
    NonFiniteInput { field: &'static str },
    #[error("{field} must not be negative")]
    NegativeInput { field: &'static str },
    #[error("missing required input: {field}")]
    MissingInput { field: &'static str },
    #[error("invalid projection range {start}..={end}")]
    InvalidYearRange { start: i32, end: i32 },
    #[error(transparent)]
    Benchmark(#[from] BenchmarkError),
}

pub(crate) fn non_negative(field: &'static str, value: f64) -> Result<f64, CalculationError> {
    if !value.is_finite() {
        return Err(CalculationError::NonFiniteInput { field });
    }
    if value < 0.0 {
        return Err(CalculationError::NegativeInput { field });
    }
    Ok(value)
}
