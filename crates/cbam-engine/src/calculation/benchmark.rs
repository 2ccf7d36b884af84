use serde::{Deserialize, Serialize};

use crate::entries::FunctionalUnit;
use crate::reference::{GoodsCategory, MarkupTier, ReferenceTables};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BenchmarkError {
    #[error("CN code {cn_code} does not map to a CBAM goods category")]
    UnclassifiedGood { cn_code: String },
    #[error("no benchmark is published for {}", category.label())]
    NoBenchmarkForCategory { category: GoodsCategory },
}

/// How the route behind a resolved benchmark was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteSource {
    Declared,
    CategoryDefault,
    /// The requested (or default) route has no benchmark; the first route in table order was used.
    FallbackFirstAvailable { requested: Option<String> },
}

impl RouteSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, RouteSource::FallbackFirstAvailable { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBenchmark {
    pub cn_code: String,
    pub category: GoodsCategory,
    pub route: String,
    /// tCO2e per functional unit.
    pub value: f64,
    pub unit: FunctionalUnit,
    pub is_annex_ii: bool,
    pub year: i32,
    /// Edition year of the benchmark record actually used.
    pub benchmark_year: i32,
    pub route_source: RouteSource,
    pub source: String,
}

/// Resolves the benchmark for a CN code and optional declared route.
///
/// Without a declared route the category default is used. A route with no benchmark for the
/// category falls back to the first route in table order and the fallback is recorded in
/// [`ResolvedBenchmark::route_source`].
pub fn resolve_benchmark(
    tables: &ReferenceTables,
    cn_code: &str,
    route: Option<&str>,
    year: i32,
) -> Result<ResolvedBenchmark, BenchmarkError> {
    let code = cn_code.trim();
    let category = tables
        .classify(code)
        .ok_or_else(|| BenchmarkError::UnclassifiedGood {
            cn_code: code.to_string(),
        })?;

    let declared = route.map(str::trim).filter(|route| !route.is_empty());
    let candidate = declared.or_else(|| tables.default_route(category));

    let (record, route_source) = match candidate.and_then(|r| tables.benchmark(category, r, year)) {
        Some(record) if declared.is_some() => (record, RouteSource::Declared),
        Some(record) => (record, RouteSource::CategoryDefault),
        None => {
            let first = tables
                .routes_for(category)
                .into_iter()
                .next()
                .and_then(|r| tables.benchmark(category, r, year))
                .ok_or(BenchmarkError::NoBenchmarkForCategory { category })?;
            tracing::warn!(
                cn_code = code,
                category = category.label(),
                requested = ?candidate,
                fallback = %first.route,
                "benchmark route not found; using first available route"
            );
            (
                first,
                RouteSource::FallbackFirstAvailable {
                    requested: candidate.map(str::to_string),
                },
            )
        }
    };

    tracing::debug!(
        cn_code = code,
        category = category.label(),
        route = %record.route,
        value = record.intensity,
        "resolved benchmark"
    );

    Ok(ResolvedBenchmark {
        cn_code: code.to_string(),
        category,
        route: record.route.clone(),
        value: record.intensity,
        unit: tables.functional_unit(category),
        is_annex_ii: tables.is_annex_ii(category),
        year,
        benchmark_year: record.year,
        route_source,
        source: record.source.clone(),
    })
}

/// Default value increased by the origin country's markup tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultMarkup {
    pub country: String,
    pub tier: MarkupTier,
    pub markup_percent: f64,
    pub base_intensity: f64,
    pub marked_up_intensity: f64,
}

pub fn apply_default_markup(
    tables: &ReferenceTables,
    base_intensity: f64,
    country: &str,
) -> DefaultMarkup {
    let country = country.trim().to_ascii_uppercase();
    let (tier, markup_percent) = tables.markup_for(&country);
    DefaultMarkup {
        marked_up_intensity: base_intensity * (1.0 + markup_percent / 100.0),
        country,
        tier,
        markup_percent,
        base_intensity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_route_resolves_its_benchmark() {
        let tables = ReferenceTables::builtin();
        let resolved =
            resolve_benchmark(&tables, "72083000", Some("scrap_eaf_route"), 2026).expect("resolves");
        assert_eq!(resolved.category, GoodsCategory::IronSteel);
        assert_eq!(resolved.value, 0.283);
        assert_eq!(resolved.unit, FunctionalUnit::Tonnes);
        assert_eq!(resolved.route_source, RouteSource::Declared);
        assert!(!resolved.is_annex_ii);
    }

    #[test]
    fn missing_route_uses_category_default() {
        let tables = ReferenceTables::builtin();
        let resolved = resolve_benchmark(&tables, "72083000", None, 2026).expect("resolves");
        assert_eq!(resolved.route, "bf_bof_route");
        assert_eq!(resolved.value, 1.370);
        assert_eq!(resolved.route_source, RouteSource::CategoryDefault);

        let blank = resolve_benchmark(&tables, "72083000", Some("  "), 2026).expect("resolves");
        assert_eq!(blank.route_source, RouteSource::CategoryDefault);
    }

    #[test]
    fn unknown_route_falls_back_and_is_flagged() {
        let tables = ReferenceTables::builtin();
        let resolved =
            resolve_benchmark(&tables, "76011000", Some("induction_furnace"), 2026).expect("falls back");
        assert_eq!(resolved.route, "primary_smelting");
        assert!(resolved.route_source.is_fallback());
        assert_eq!(
            resolved.route_source,
            RouteSource::FallbackFirstAvailable {
                requested: Some("induction_furnace".to_string())
            }
        );
    }

    #[test]
    fn units_and_annex_ii_follow_category() {
        let tables = ReferenceTables::builtin();
        let clinker = resolve_benchmark(&tables, "25231000", None, 2026).expect("clinker");
        assert_eq!(clinker.category, GoodsCategory::Clinker);
        assert_eq!(clinker.unit, FunctionalUnit::TonnesClinker);
        assert!(clinker.is_annex_ii);

        let power = resolve_benchmark(&tables, "27160000", None, 2026).expect("electricity");
        assert_eq!(power.unit, FunctionalUnit::MegawattHours);

        let fertiliser = resolve_benchmark(&tables, "31021010", None, 2026).expect("fertiliser");
        assert_eq!(fertiliser.unit, FunctionalUnit::KilogramsNitrogen);
    }

    #[test]
    fn later_years_reuse_latest_edition() {
        let tables = ReferenceTables::builtin();
        let resolved = resolve_benchmark(&tables, "72083000", None, 2030).expect("resolves");
        assert_eq!(resolved.year, 2030);
        assert_eq!(resolved.benchmark_year, 2026);
    }

    #[test]
    fn unclassified_code_is_an_error() {
        let tables = ReferenceTables::builtin();
        let error = resolve_benchmark(&tables, "09011100", None, 2026).expect_err("coffee");
        assert_eq!(
            error,
            BenchmarkError::UnclassifiedGood {
                cn_code: "09011100".to_string()
            }
        );
    }

    #[test]
    fn markup_scales_by_country_tier() {
        let tables = ReferenceTables::builtin();
        let high = apply_default_markup(&tables, 1.0, "cn");
        assert_eq!(high.tier, MarkupTier::High);
        assert!((high.marked_up_intensity - 1.3).abs() < 1e-9);

        let unlisted = apply_default_markup(&tables, 2.0, "NO");
        assert_eq!(unlisted.tier, MarkupTier::Low);
        assert!((unlisted.marked_up_intensity - 2.2).abs() < 1e-9);
    }
}
