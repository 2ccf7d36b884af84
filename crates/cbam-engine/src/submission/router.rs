use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::domain::SubmissionReport;
use super::service::{BenchmarkQuery, ComplianceService};
use crate::calculation::{BenchmarkError, CalculationError, ProjectionRequest};
use crate::entries::EmissionEntry;

/// Router exposing the engine's calculation and validation operations.
pub fn compliance_router(service: Arc<ComplianceService>) -> Router {
    Router::new()
        .route("/api/v1/benchmarks/resolve", post(resolve_handler))
        .route("/api/v1/benchmarks/suggest-route", post(suggest_route_handler))
        .route("/api/v1/free-allocation", post(free_allocation_handler))
        .route("/api/v1/chargeable-emissions", post(chargeable_handler))
        .route("/api/v1/phase-out/projection", post(projection_handler))
        .route("/api/v1/entries/validate", post(validate_entry_handler))
        .route("/api/v1/entries/certificates", post(entry_certificates_handler))
        .route("/api/v1/entries/data-quality", post(data_quality_handler))
        .route("/api/v1/materiality", post(materiality_handler))
        .route("/api/v1/eori/validate", post(eori_handler))
        .route("/api/v1/eori/validate-batch", post(eori_batch_handler))
        .route("/api/v1/submissions/readiness", post(readiness_handler))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct FreeAllocationRequest {
    benchmark_value: f64,
    quantity: f64,
    year: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChargeableRequest {
    total_embedded_emissions: f64,
    free_allocation_adjustment: f64,
    #[serde(default)]
    foreign_carbon_price_deduction: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DataQualityRequest {
    entry: EmissionEntry,
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchRequest {
    entries: Vec<EmissionEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EoriRequest {
    eori: String,
    #[serde(default)]
    member_state: Option<String>,
    #[serde(default)]
    strict: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EoriBatchRequest {
    identifiers: Vec<String>,
    #[serde(default)]
    member_state: Option<String>,
    #[serde(default)]
    strict: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReadinessRequest {
    report: SubmissionReport,
    entries: Vec<EmissionEntry>,
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

fn error_response(status: StatusCode, message: String) -> Response {
    let payload = json!({
        "error": message,
    });
    (status, Json(payload)).into_response()
}

fn benchmark_error(error: BenchmarkError) -> Response {
    let status = match error {
        BenchmarkError::UnclassifiedGood { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        BenchmarkError::NoBenchmarkForCategory { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, error.to_string())
}

fn calculation_error(error: CalculationError) -> Response {
    match error {
        CalculationError::Benchmark(inner) => benchmark_error(inner),
        other => error_response(StatusCode::BAD_REQUEST, other.to_string()),
    }
}

pub(crate) async fn resolve_handler(
    State(service): State<Arc<ComplianceService>>,
    Json(query): Json<BenchmarkQuery>,
) -> Response {
    match service.resolve(&query) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => benchmark_error(error),
    }
}

pub(crate) async fn suggest_route_handler(
    State(service): State<Arc<ComplianceService>>,
    Json(query): Json<BenchmarkQuery>,
) -> Response {
    match service.suggest(&query) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => benchmark_error(error),
    }
}

pub(crate) async fn free_allocation_handler(
    State(service): State<Arc<ComplianceService>>,
    Json(request): Json<FreeAllocationRequest>,
) -> Response {
    match service.free_allocation(request.benchmark_value, request.quantity, request.year) {
        Ok(allocation) => (StatusCode::OK, Json(allocation)).into_response(),
        Err(error) => calculation_error(error),
    }
}

pub(crate) async fn chargeable_handler(
    State(service): State<Arc<ComplianceService>>,
    Json(request): Json<ChargeableRequest>,
) -> Response {
    match service.chargeable(
        request.total_embedded_emissions,
        request.free_allocation_adjustment,
        request.foreign_carbon_price_deduction,
    ) {
        Ok(chargeable) => (StatusCode::OK, Json(chargeable)).into_response(),
        Err(error) => calculation_error(error),
    }
}

pub(crate) async fn projection_handler(
    State(service): State<Arc<ComplianceService>>,
    Json(request): Json<ProjectionRequest>,
) -> Response {
    match service.project(&request) {
        Ok(years) => (StatusCode::OK, Json(json!({ "years": years }))).into_response(),
        Err(error) => calculation_error(error),
    }
}

pub(crate) async fn validate_entry_handler(
    State(service): State<Arc<ComplianceService>>,
    Json(entry): Json<EmissionEntry>,
) -> Response {
    let result = service.validate_entry(&entry);
    (StatusCode::OK, Json(result)).into_response()
}

pub(crate) async fn entry_certificates_handler(
    State(service): State<Arc<ComplianceService>>,
    Json(entry): Json<EmissionEntry>,
) -> Response {
    match service.entry_certificates(&entry) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => calculation_error(error),
    }
}

pub(crate) async fn data_quality_handler(
    State(service): State<Arc<ComplianceService>>,
    Json(request): Json<DataQualityRequest>,
) -> Response {
    let score = service.data_quality(&request.entry, request.as_of);
    (StatusCode::OK, Json(score)).into_response()
}

pub(crate) async fn materiality_handler(
    State(service): State<Arc<ComplianceService>>,
    Json(request): Json<BatchRequest>,
) -> Response {
    let report = service.materiality(&request.entries);
    (StatusCode::OK, Json(report)).into_response()
}

pub(crate) async fn eori_handler(
    State(service): State<Arc<ComplianceService>>,
    Json(request): Json<EoriRequest>,
) -> Response {
    let result = service.eori(&request.eori, request.member_state.as_deref(), request.strict);
    (StatusCode::OK, Json(result)).into_response()
}

pub(crate) async fn eori_batch_handler(
    State(service): State<Arc<ComplianceService>>,
    Json(request): Json<EoriBatchRequest>,
) -> Response {
    let report = service.eori_batch(
        &request.identifiers,
        request.member_state.as_deref(),
        request.strict,
    );
    (StatusCode::OK, Json(report)).into_response()
}

pub(crate) async fn readiness_handler(
    State(service): State<Arc<ComplianceService>>,
    Json(request): Json<ReadinessRequest>,
) -> Response {
    match service
        .readiness(request.report, request.entries, request.as_of)
        .await
    {
        Ok(readiness) => (StatusCode::OK, Json(readiness)).into_response(),
        Err(error) => error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    }
}
