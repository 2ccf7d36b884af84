//! Regulatory calculation and validation engine for EU CBAM declarations.
//!
//! Every public operation is a pure function over an [`EmissionEntry`] (or a batch of them) and
//! an immutable [`ReferenceTables`] set. Results are plain value objects that callers persist on
//! their own.

pub mod calculation;
pub mod config;
pub mod entries;
pub mod error;
pub mod reference;
pub mod submission;
pub mod telemetry;
pub mod validation;

pub use calculation::{
    apply_default_markup, calculate_chargeable_emissions, calculate_free_allocation,
    compute_entry_certificates, project_phase_out, resolve_benchmark, suggest_route,
    BenchmarkError, CalculationError, ChargeableEmissions, DefaultMarkup, EntryCertificates,
    FreeAllocation, ProjectionRequest, ProjectionYear, ResolvedBenchmark, RouteSource,
    RouteSuggestion,
};
pub use entries::{
    CalculationMethod, EmissionEntry, EntryImportError, EntryImporter, FunctionalUnit,
    VerificationStatus,
};
pub use error::AppError;
pub use reference::{GoodsCategory, MarkupTier, ReferenceDataError, ReferenceTables};
pub use submission::{
    compliance_router, validate_for_submission, validate_for_submission_concurrent,
    ComplianceService, SubmissionError, SubmissionReadiness, SubmissionReport,
};
pub use validation::{
    assess_materiality, assess_materiality_batch, score_data_quality, validate_entry,
    validate_eori, validate_eori_batch, validate_for_cbam, DataQualityScore, EoriResult,
    IssueKind, MaterialityAssessment, MaterialityReport, Severity, ValidationIssue,
    ValidationResult,
};
