//! 2026 edition of the reference data shipped with the engine.

use std::collections::{BTreeMap, BTreeSet};

use super::category::GoodsCategory;
use super::tables::{BenchmarkRecord, CnPrefixRule, MarkupTier, MarkupTierRule, PhaseOutSchedule};
use crate::entries::FunctionalUnit;

pub(crate) const EDITION: &str = "2026";

const BENCHMARK_SOURCE: &str = "CBAM default values for the definitive period, 2026 edition";

pub(crate) fn phase_out_schedule() -> PhaseOutSchedule {
    PhaseOutSchedule::new(BTreeMap::from([
        (2026, 0.025),
        (2027, 0.05),
        (2028, 0.10),
        (2029, 0.225),
        (2030, 0.4875),
        (2031, 0.61),
        (2032, 0.735),
        (2033, 0.86),
        (2034, 1.00),
    ]))
}

fn record(category: GoodsCategory, route: &str, intensity: f64) -> BenchmarkRecord {
    BenchmarkRecord {
        category,
        route: route.to_string(),
        year: 2026,
        intensity,
        source: BENCHMARK_SOURCE.to_string(),
    }
}

pub(crate) fn benchmarks() -> Vec<BenchmarkRecord> {
    vec![
        record(GoodsCategory::IronSteel, "bf_bof_route", 1.370),
        record(GoodsCategory::IronSteel, "dri_eaf_route", 0.481),
        record(GoodsCategory::IronSteel, "scrap_eaf_route", 0.283),
        record(GoodsCategory::Aluminium, "primary_smelting", 1.514),
        record(GoodsCategory::Aluminium, "secondary_remelting", 0.224),
        record(GoodsCategory::Cement, "portland_cement", 0.766),
        record(GoodsCategory::Cement, "blended_cement", 0.552),
        record(GoodsCategory::Clinker, "grey_clinker", 0.693),
        record(GoodsCategory::Clinker, "white_clinker", 0.957),
        record(GoodsCategory::Fertilisers, "haber_bosch_gas", 0.0025),
        record(GoodsCategory::Fertilisers, "haber_bosch_coal", 0.0041),
        record(GoodsCategory::Fertilisers, "nitric_acid_abated", 0.0018),
        record(GoodsCategory::Hydrogen, "steam_methane_reforming", 8.85),
        record(GoodsCategory::Hydrogen, "coal_gasification", 19.0),
        record(GoodsCategory::Hydrogen, "electrolysis", 0.0),
        record(GoodsCategory::Electricity, "grid_average", 0.376),
        record(GoodsCategory::Electricity, "fossil_fired", 0.820),
        record(GoodsCategory::Electricity, "renewable", 0.0),
    ]
}

pub(crate) fn default_routes() -> BTreeMap<GoodsCategory, String> {
    [
        (GoodsCategory::IronSteel, "bf_bof_route"),
        (GoodsCategory::Aluminium, "primary_smelting"),
        (GoodsCategory::Cement, "portland_cement"),
        (GoodsCategory::Clinker, "grey_clinker"),
        (GoodsCategory::Fertilisers, "haber_bosch_gas"),
        (GoodsCategory::Hydrogen, "steam_methane_reforming"),
        (GoodsCategory::Electricity, "grid_average"),
    ]
    .into_iter()
    .map(|(category, route)| (category, route.to_string()))
    .collect()
}

pub(crate) fn cn_prefixes() -> Vec<CnPrefixRule> {
    [
        ("260112", GoodsCategory::IronSteel),
        ("72", GoodsCategory::IronSteel),
        ("73", GoodsCategory::IronSteel),
        ("76", GoodsCategory::Aluminium),
        ("250700", GoodsCategory::Cement),
        ("2523", GoodsCategory::Cement),
        ("25231", GoodsCategory::Clinker),
        ("2808", GoodsCategory::Fertilisers),
        ("2814", GoodsCategory::Fertilisers),
        ("283421", GoodsCategory::Fertilisers),
        ("3102", GoodsCategory::Fertilisers),
        ("3105", GoodsCategory::Fertilisers),
        ("280410", GoodsCategory::Hydrogen),
        ("271600", GoodsCategory::Electricity),
    ]
    .into_iter()
    .map(|(prefix, category)| CnPrefixRule {
        prefix: prefix.to_string(),
        category,
    })
    .collect()
}

/// Categories whose default benchmarks already include indirect emissions.
pub(crate) fn annex_ii_categories() -> BTreeSet<GoodsCategory> {
    BTreeSet::from([
        GoodsCategory::Cement,
        GoodsCategory::Clinker,
        GoodsCategory::Fertilisers,
    ])
}

pub(crate) fn functional_units() -> BTreeMap<GoodsCategory, FunctionalUnit> {
    GoodsCategory::ALL
        .into_iter()
        .map(|category| (category, category.canonical_unit()))
        .collect()
}

pub(crate) fn eu_member_states() -> BTreeSet<String> {
    [
        "AT", "BE", "BG", "HR", "CY", "CZ", "DK", "EE", "FI", "FR", "DE", "GR", "HU", "IE", "IT",
        "LV", "LT", "LU", "MT", "NL", "PL", "PT", "RO", "SK", "SI", "ES", "SE",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn countries(codes: &[&str]) -> BTreeSet<String> {
    codes.iter().map(|code| code.to_string()).collect()
}

pub(crate) fn markup_tiers() -> Vec<MarkupTierRule> {
    vec![
        MarkupTierRule {
            tier: MarkupTier::High,
            percent: 30.0,
            countries: countries(&["CN", "IN", "RU", "KZ", "ZA", "ID", "VN", "IR", "EG", "UA"]),
        },
        MarkupTierRule {
            tier: MarkupTier::Medium,
            percent: 20.0,
            countries: countries(&["TR", "BR", "MX", "SA", "AE", "MY", "TH", "DZ", "RS", "BA"]),
        },
        MarkupTierRule {
            tier: MarkupTier::Low,
            percent: 10.0,
            countries: BTreeSet::new(),
        },
    ]
}
