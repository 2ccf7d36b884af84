use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::builtin;
use super::category::GoodsCategory;
use crate::entries::FunctionalUnit;

/// First reporting year of the definitive regime.
pub const REGIME_START_YEAR: i32 = 2026;

/// Chargeable fraction applied when a year is missing from the schedule.
pub const DEFAULT_CBAM_FACTOR: f64 = 0.025;

/// Errors raised while loading or checking a reference table edition.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceDataError {
    #[error("failed to read reference data: {0}")]
    Io(#[from] std::io::Error),
    #[error("reference data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("phase-out factor for {year} must be within [0, 1], found {value}")]
    ScheduleValueOutOfRange { year: i32, value: f64 },
    #[error("phase-out factor for {year} ({value}) is lower than the previous year ({previous})")]
    ScheduleNotMonotonic { year: i32, previous: f64, value: f64 },
    #[error("benchmark {category:?}/{route} has invalid intensity {value}")]
    InvalidBenchmark {
        category: GoodsCategory,
        route: String,
        value: f64,
    },
    #[error("default route '{route}' for {category:?} has no benchmark")]
    UnknownDefaultRoute {
        category: GoodsCategory,
        route: String,
    },
    #[error("markup tier {tier:?} has invalid percentage {percent}")]
    InvalidMarkup { tier: MarkupTier, percent: f64 },
    #[error("EU member state list is empty")]
    EmptyMemberStates,
}

/// Year → chargeable fraction of benchmark emissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhaseOutSchedule(BTreeMap<i32, f64>);

impl PhaseOutSchedule {
    pub fn new(factors: BTreeMap<i32, f64>) -> Self {
        Self(factors)
    }

    pub fn get(&self, year: i32) -> Option<f64> {
        self.0.get(&year).copied()
    }

    /// Factor for `year`, falling back to the 2026 factor for years outside the schedule.
    pub fn factor(&self, year: i32) -> f64 {
        self.get(year).unwrap_or(DEFAULT_CBAM_FACTOR)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.0.iter().map(|(year, factor)| (*year, *factor))
    }

    pub fn first_year(&self) -> Option<i32> {
        self.0.keys().next().copied()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.0.keys().next_back().copied()
    }

    fn check(&self) -> Result<(), ReferenceDataError> {
        let mut previous: Option<f64> = None;
        for (year, value) in self.iter() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ReferenceDataError::ScheduleValueOutOfRange { year, value });
            }
            if let Some(previous) = previous {
                if value < previous {
                    return Err(ReferenceDataError::ScheduleNotMonotonic {
                        year,
                        previous,
                        value,
                    });
                }
            }
            previous = Some(value);
        }
        Ok(())
    }
}

/// Published default intensity for one category/route/year combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub category: GoodsCategory,
    pub route: String,
    pub year: i32,
    /// tCO2e per functional unit.
    pub intensity: f64,
    pub source: String,
}

/// Maps a CN code prefix onto a goods category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CnPrefixRule {
    pub prefix: String,
    pub category: GoodsCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkupTier {
    High,
    Medium,
    Low,
}

impl MarkupTier {
    pub const fn label(self) -> &'static str {
        match self {
            MarkupTier::High => "high",
            MarkupTier::Medium => "medium",
            MarkupTier::Low => "low",
        }
    }
}

/// Default-value markup applied to goods from the listed origins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupTierRule {
    pub tier: MarkupTier,
    pub percent: f64,
    #[serde(default)]
    pub countries: BTreeSet<String>,
}

/// One edition of the CBAM reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTables {
    edition: String,
    phase_out_schedule: PhaseOutSchedule,
    benchmarks: Vec<BenchmarkRecord>,
    #[serde(default = "builtin::default_routes")]
    default_routes: BTreeMap<GoodsCategory, String>,
    #[serde(default = "builtin::cn_prefixes")]
    cn_prefixes: Vec<CnPrefixRule>,
    #[serde(default = "builtin::annex_ii_categories")]
    annex_ii_categories: BTreeSet<GoodsCategory>,
    #[serde(default = "builtin::functional_units")]
    functional_units: BTreeMap<GoodsCategory, FunctionalUnit>,
    #[serde(default = "builtin::eu_member_states")]
    eu_member_states: BTreeSet<String>,
    #[serde(default = "builtin::markup_tiers")]
    markup_tiers: Vec<MarkupTierRule>,
}

impl ReferenceTables {
    /// Tables shipped with the engine (2026 edition).
    pub fn builtin() -> Self {
        Self {
            edition: builtin::EDITION.to_string(),
            phase_out_schedule: builtin::phase_out_schedule(),
            benchmarks: builtin::benchmarks(),
            default_routes: builtin::default_routes(),
            cn_prefixes: builtin::cn_prefixes(),
            annex_ii_categories: builtin::annex_ii_categories(),
            functional_units: builtin::functional_units(),
            eu_member_states: builtin::eu_member_states(),
            markup_tiers: builtin::markup_tiers(),
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReferenceDataError> {
        let tables: ReferenceTables = serde_json::from_reader(reader)?;
        tables.validate()?;
        tracing::info!(
            edition = %tables.edition,
            benchmarks = tables.benchmarks.len(),
            "loaded CBAM reference tables"
        );
        Ok(tables)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceDataError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Structural checks every edition must pass before it is used.
    pub fn validate(&self) -> Result<(), ReferenceDataError> {
        self.phase_out_schedule.check()?;

        for record in &self.benchmarks {
            if !record.intensity.is_finite() || record.intensity < 0.0 {
                return Err(ReferenceDataError::InvalidBenchmark {
                    category: record.category,
                    route: record.route.clone(),
                    value: record.intensity,
                });
            }
        }

        for (category, route) in &self.default_routes {
            let known = self
                .benchmarks
                .iter()
                .any(|record| record.category == *category && &record.route == route);
            if !known {
                return Err(ReferenceDataError::UnknownDefaultRoute {
                    category: *category,
                    route: route.clone(),
                });
            }
        }

        for rule in &self.markup_tiers {
            if !rule.percent.is_finite() || rule.percent < 0.0 {
                return Err(ReferenceDataError::InvalidMarkup {
                    tier: rule.tier,
                    percent: rule.percent,
                });
            }
        }

        if self.eu_member_states.is_empty() {
            return Err(ReferenceDataError::EmptyMemberStates);
        }

        Ok(())
    }

    pub fn edition(&self) -> &str {
        &self.edition
    }

    pub fn phase_out(&self) -> &PhaseOutSchedule {
        &self.phase_out_schedule
    }

    pub fn cbam_factor(&self, year: i32) -> f64 {
        self.phase_out_schedule.factor(year)
    }

    /// Longest-prefix match of a CN code against the classification rules.
    pub fn classify(&self, cn_code: &str) -> Option<GoodsCategory> {
        let code = cn_code.trim();
        self.cn_prefixes
            .iter()
            .filter(|rule| code.starts_with(rule.prefix.as_str()))
            .max_by_key(|rule| rule.prefix.len())
            .map(|rule| rule.category)
    }

    pub fn default_route(&self, category: GoodsCategory) -> Option<&str> {
        self.default_routes.get(&category).map(String::as_str)
    }

    /// Routes with a benchmark for `category`, in table order and without duplicates.
    pub fn routes_for(&self, category: GoodsCategory) -> Vec<&str> {
        let mut routes: Vec<&str> = Vec::new();
        for record in self.benchmarks.iter().filter(|r| r.category == category) {
            if !routes.contains(&record.route.as_str()) {
                routes.push(record.route.as_str());
            }
        }
        routes
    }

    /// Benchmark for the given route, taking the latest edition year not after `year`, or the
    /// earliest available year when every record is newer.
    pub fn benchmark(
        &self,
        category: GoodsCategory,
        route: &str,
        year: i32,
    ) -> Option<&BenchmarkRecord> {
        let candidates = self
            .benchmarks
            .iter()
            .filter(|record| record.category == category && record.route == route);

        let mut best_past: Option<&BenchmarkRecord> = None;
        let mut earliest: Option<&BenchmarkRecord> = None;
        for record in candidates {
            if record.year <= year && best_past.map_or(true, |best| record.year > best.year) {
                best_past = Some(record);
            }
            if earliest.map_or(true, |first| record.year < first.year) {
                earliest = Some(record);
            }
        }
        best_past.or(earliest)
    }

    pub fn is_annex_ii(&self, category: GoodsCategory) -> bool {
        self.annex_ii_categories.contains(&category)
    }

    pub fn functional_unit(&self, category: GoodsCategory) -> FunctionalUnit {
        self.functional_units
            .get(&category)
            .copied()
            .unwrap_or_else(|| category.canonical_unit())
    }

    pub fn eu_member_states(&self) -> &BTreeSet<String> {
        &self.eu_member_states
    }

    pub fn is_eu_member(&self, country_code: &str) -> bool {
        self.eu_member_states
            .contains(&country_code.trim().to_ascii_uppercase())
    }

    /// Markup tier for an origin country; origins not listed in any tier fall into the low tier.
    pub fn markup_for(&self, country_code: &str) -> (MarkupTier, f64) {
        let code = country_code.trim().to_ascii_uppercase();
        if let Some(rule) = self
            .markup_tiers
            .iter()
            .find(|rule| rule.countries.contains(&code))
        {
            return (rule.tier, rule.percent);
        }

        let low = self
            .markup_tiers
            .iter()
            .find(|rule| rule.tier == MarkupTier::Low)
            .map(|rule| rule.percent)
            .unwrap_or(0.0);
        (MarkupTier::Low, low)
    }

    pub fn is_high_carbon_origin(&self, country_code: &str) -> bool {
        matches!(self.markup_for(country_code).0, MarkupTier::High)
    }
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self::builtin()
    }
}
