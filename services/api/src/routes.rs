use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use cbam_engine::{compliance_router, ComplianceService, FunctionalUnit, GoodsCategory};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct ReferenceSummary {
    pub(crate) edition: String,
    pub(crate) phase_out: BTreeMap<i32, f64>,
    pub(crate) categories: Vec<CategorySummary>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CategorySummary {
    pub(crate) category: GoodsCategory,
    pub(crate) functional_unit: FunctionalUnit,
    pub(crate) annex_ii: bool,
    pub(crate) default_route: Option<String>,
    pub(crate) routes: Vec<String>,
}

pub(crate) fn with_application_routes(service: Arc<ComplianceService>) -> axum::Router {
    compliance_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/reference",
            axum::routing::get(reference_summary_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready", "reference_edition": state.tables.edition() })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn reference_summary_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<ReferenceSummary> {
    let tables = &state.tables;
    let categories = GoodsCategory::ALL
        .into_iter()
        .map(|category| CategorySummary {
            category,
            functional_unit: tables.functional_unit(category),
            annex_ii: tables.is_annex_ii(category),
            default_route: tables.default_route(category).map(str::to_string),
            routes: tables
                .routes_for(category)
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
        .collect();

    Json(ReferenceSummary {
        edition: tables.edition().to_string(),
        phase_out: tables.phase_out().iter().collect(),
        categories,
    })
}
