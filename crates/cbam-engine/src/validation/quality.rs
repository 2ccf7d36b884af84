use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entries::{present, CalculationMethod, EmissionEntry, VerificationStatus};
use crate::reference::REGIME_START_YEAR;

/// Relative tolerance between declared total and quantity × direct intensity.
const EMBEDDED_DEVIATION_TOLERANCE_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    pub completeness: f64,
    pub accuracy: f64,
    pub consistency: f64,
    pub documentation: f64,
    pub timeliness: f64,
}

impl QualityWeights {
    pub const STANDARD: QualityWeights = QualityWeights {
        completeness: 0.30,
        accuracy: 0.25,
        consistency: 0.20,
        documentation: 0.15,
        timeliness: 0.10,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityRating {
    Critical,
    Poor,
    Acceptable,
    Good,
    Excellent,
}

impl QualityRating {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => QualityRating::Excellent,
            s if s >= 75.0 => QualityRating::Good,
            s if s >= 60.0 => QualityRating::Acceptable,
            s if s >= 40.0 => QualityRating::Poor,
            _ => QualityRating::Critical,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            QualityRating::Excellent => "excellent",
            QualityRating::Good => "good",
            QualityRating::Acceptable => "acceptable",
            QualityRating::Poor => "poor",
            QualityRating::Critical => "critical",
        }
    }
}

/// Declared total next to the figure derived from quantity × direct intensity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedEmissionsCheck {
    pub declared: f64,
    pub computed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation_percent: Option<f64>,
    pub within_tolerance: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityScore {
    pub completeness: f64,
    pub accuracy: f64,
    pub consistency: f64,
    pub documentation: f64,
    pub timeliness: f64,
    pub weights: QualityWeights,
    /// Weighted sum rounded to one decimal.
    pub composite: f64,
    pub rating: QualityRating,
    pub recommendations: Vec<String>,
    pub missing_required_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedded_emissions: Option<EmbeddedEmissionsCheck>,
}

/// Scores one entry on five weighted dimensions. `as_of` anchors the timeliness checks.
pub fn score_data_quality(entry: &EmissionEntry, as_of: NaiveDate) -> DataQualityScore {
    let weights = QualityWeights::STANDARD;
    let (completeness, missing_required_fields) = completeness(entry);
    let embedded_emissions = embedded_check(entry);
    let accuracy = accuracy(entry, embedded_emissions.as_ref());
    let consistency = consistency(entry);
    let documentation = documentation(entry);
    let timeliness = timeliness(entry, as_of);

    let weighted = completeness * weights.completeness
        + accuracy * weights.accuracy
        + consistency * weights.consistency
        + documentation * weights.documentation
        + timeliness * weights.timeliness;
    let composite = (weighted * 10.0).round() / 10.0;

    let mut recommendations = Vec::new();
    if completeness < 80.0 {
        if missing_required_fields.is_empty() {
            recommendations.push(
                "Add installation, production route and customs references to complete the record"
                    .to_string(),
            );
        } else {
            recommendations.push(format!(
                "Complete the required fields: {}",
                missing_required_fields.join(", ")
            ));
        }
    }
    if accuracy < 70.0 {
        recommendations.push(
            "Review quantity, intensity and embedded emission figures for errors".to_string(),
        );
    }
    if documentation < 50.0 {
        recommendations.push(
            "Attach the monitoring plan, operator emission report and verification statement"
                .to_string(),
        );
    }
    let on_defaults = entry.uses_default_values
        || entry.calculation_method == Some(CalculationMethod::DefaultValues);
    if on_defaults && present(&entry.monitoring_plan_ref).is_none() {
        recommendations.push(
            "Move from default values to installation-specific emissions backed by a monitoring plan"
                .to_string(),
        );
    }

    DataQualityScore {
        completeness,
        accuracy,
        consistency,
        documentation,
        timeliness,
        weights,
        composite,
        rating: QualityRating::from_score(composite),
        recommendations,
        missing_required_fields,
        embedded_emissions,
    }
}

fn completeness(entry: &EmissionEntry) -> (f64, Vec<String>) {
    let required = [
        ("cn_code", present(&entry.cn_code).is_some()),
        ("country_of_origin", present(&entry.country_of_origin).is_some()),
        ("quantity", entry.quantity.is_some()),
        ("functional_unit", present(&entry.functional_unit).is_some()),
        (
            "direct_emissions_specific",
            entry.direct_emissions_specific.is_some(),
        ),
        ("calculation_method", entry.calculation_method.is_some()),
        ("reporting_year", entry.reporting_year.is_some()),
        ("declarant_eori", present(&entry.declarant_eori).is_some()),
    ];
    let recommended = [
        present(&entry.installation_id).is_some(),
        present(&entry.production_route).is_some(),
        entry.indirect_emissions_specific.is_some(),
        present(&entry.customs_declaration_ref).is_some(),
        entry.import_date.is_some(),
    ];

    let required_present = required.iter().filter(|(_, present)| *present).count();
    let recommended_present = recommended.iter().filter(|present| **present).count();
    let score = 70.0 * required_present as f64 / required.len() as f64
        + 30.0 * recommended_present as f64 / recommended.len() as f64;

    let missing = required
        .iter()
        .filter(|(_, present)| !*present)
        .map(|(field, _)| field.to_string())
        .collect();
    (score, missing)
}

fn embedded_check(entry: &EmissionEntry) -> Option<EmbeddedEmissionsCheck> {
    let declared = entry.total_embedded_emissions?;
    let computed = entry.quantity? * entry.direct_emissions_specific?;
    let deviation_percent =
        (computed != 0.0).then(|| (declared - computed).abs() / computed.abs() * 100.0);
    let within_tolerance = match deviation_percent {
        Some(deviation) => deviation <= EMBEDDED_DEVIATION_TOLERANCE_PERCENT,
        None => declared == 0.0,
    };
    Some(EmbeddedEmissionsCheck {
        declared,
        computed,
        deviation_percent,
        within_tolerance,
    })
}

fn accuracy(entry: &EmissionEntry, embedded: Option<&EmbeddedEmissionsCheck>) -> f64 {
    let method_actual = entry
        .calculation_method
        .map_or(false, CalculationMethod::uses_actual_values);

    let mut penalty: f64 = 0.0;
    if method_actual && present(&entry.installation_id).is_none() {
        penalty += 20.0;
    }
    if entry.direct_emissions_specific.map_or(false, |direct| direct < 0.0) {
        penalty += 30.0;
    }
    if embedded.map_or(false, |check| !check.within_tolerance) {
        penalty += 15.0;
    }
    if entry.quantity.map_or(false, |quantity| quantity <= 0.0) {
        penalty += 40.0;
    }
    if entry.reporting_year.map_or(false, |year| year < REGIME_START_YEAR) {
        penalty += 50.0;
    }
    if entry
        .normalized_cn_code()
        .map_or(false, |code| code.chars().count() != 8)
    {
        penalty += 10.0;
    }
    (100.0 - penalty).max(0.0)
}

fn consistency(entry: &EmissionEntry) -> f64 {
    let method_actual = entry
        .calculation_method
        .map_or(false, CalculationMethod::uses_actual_values);

    let mut penalty: f64 = 0.0;
    if present(&entry.functional_unit).is_some() && entry.parsed_unit().is_none() {
        penalty += 20.0;
    }
    if entry.uses_default_values && method_actual {
        penalty += 30.0;
    }
    if method_actual
        && entry
            .default_value_markup_percent
            .map_or(false, |markup| markup != 0.0)
    {
        penalty += 20.0;
    }
    (100.0 - penalty).max(0.0)
}

fn documentation(entry: &EmissionEntry) -> f64 {
    let mut credit = 0.0;
    if present(&entry.monitoring_plan_ref).is_some() {
        credit += 30.0;
    }
    if present(&entry.operator_report_ref).is_some() {
        credit += 25.0;
    }
    if entry.verification_status == VerificationStatus::AccreditedSatisfactory {
        credit += 25.0;
    }
    if entry.has_carbon_price() && present(&entry.carbon_price_proof).is_some() {
        credit += 20.0;
    }
    credit
}

fn timeliness(entry: &EmissionEntry, as_of: NaiveDate) -> f64 {
    let mut penalty: f64 = 0.0;
    match entry.import_date {
        None => penalty += 30.0,
        Some(imported) => {
            let age = (as_of - imported).num_days();
            if age > 365 {
                penalty += 20.0;
            } else if age > 180 {
                penalty += 10.0;
            }
        }
    }

    if entry.verification_status == VerificationStatus::Pending {
        if let Some(created) = entry.created_at {
            if (as_of - created).num_days() > 30 {
                penalty += 20.0;
            }
        }
    }
    (100.0 - penalty).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn documented_entry() -> EmissionEntry {
        EmissionEntry {
            cn_code: Some("72083000".to_string()),
            country_of_origin: Some("TR".to_string()),
            quantity: Some(100.0),
            functional_unit: Some("tonnes".to_string()),
            direct_emissions_specific: Some(1.2),
            indirect_emissions_specific: Some(0.1),
            total_embedded_emissions: Some(120.0),
            calculation_method: Some(CalculationMethod::EuMethod),
            reporting_year: Some(2026),
            production_route: Some("dri_eaf_route".to_string()),
            installation_id: Some("TR-INST-0042".to_string()),
            monitoring_plan_ref: Some("MP-2026-01".to_string()),
            operator_report_ref: Some("OR-2026-Q1".to_string()),
            declarant_eori: Some("NL123456789012".to_string()),
            carbon_price_paid: Some(1500.0),
            carbon_price_proof: Some("TR-ETS-0099".to_string()),
            verification_status: VerificationStatus::AccreditedSatisfactory,
            customs_declaration_ref: Some("26NL000000000001".to_string()),
            import_date: Some(date(2026, 2, 1)),
            created_at: Some(date(2026, 2, 2)),
            ..EmissionEntry::default()
        }
    }

    #[test]
    fn fully_documented_recent_entry_scores_one_hundred() {
        let score = score_data_quality(&documented_entry(), date(2026, 3, 15));
        assert_eq!(score.completeness, 100.0);
        assert_eq!(score.accuracy, 100.0);
        assert_eq!(score.consistency, 100.0);
        assert_eq!(score.documentation, 100.0);
        assert_eq!(score.timeliness, 100.0);
        assert_eq!(score.composite, 100.0);
        assert_eq!(score.rating, QualityRating::Excellent);
        assert!(score.recommendations.is_empty());
    }

    #[test]
    fn accuracy_penalties_are_additive() {
        let mut entry = documented_entry();
        entry.quantity = Some(0.0);
        entry.reporting_year = Some(2025);
        entry.cn_code = Some("720830".to_string());
        let score = score_data_quality(&entry, date(2026, 3, 15));
        // quantity -40, year -50, code -10, declared 120 vs computed 0 -15
        assert_eq!(score.accuracy, 0.0);

        let mut entry = documented_entry();
        entry.total_embedded_emissions = Some(130.0);
        let score = score_data_quality(&entry, date(2026, 3, 15));
        assert_eq!(score.accuracy, 85.0);
        let check = score.embedded_emissions.expect("check kept");
        assert_eq!(check.declared, 130.0);
        assert!((check.computed - 120.0).abs() < 1e-9);
        assert!(!check.within_tolerance);
    }

    #[test]
    fn consistency_flags_contradictory_method_fields() {
        let mut entry = documented_entry();
        entry.uses_default_values = true;
        entry.default_value_markup_percent = Some(20.0);
        entry.functional_unit = Some("barrels".to_string());
        let score = score_data_quality(&entry, date(2026, 3, 15));
        assert_eq!(score.consistency, 30.0);
    }

    #[test]
    fn timeliness_tracks_import_age_and_stale_verification() {
        let mut entry = documented_entry();
        entry.verification_status = VerificationStatus::Pending;
        let score = score_data_quality(&entry, date(2026, 9, 1));
        // 212 days old (-10) and pending for more than 30 days (-20)
        assert_eq!(score.timeliness, 70.0);

        entry.import_date = None;
        entry.verification_status = VerificationStatus::AccreditedSatisfactory;
        assert_eq!(score_data_quality(&entry, date(2026, 3, 1)).timeliness, 70.0);
    }

    #[test]
    fn sparse_default_value_entry_gets_recommendations() {
        let entry = EmissionEntry {
            cn_code: Some("72083000".to_string()),
            calculation_method: Some(CalculationMethod::DefaultValues),
            ..EmissionEntry::default()
        };
        let score = score_data_quality(&entry, date(2026, 3, 1));
        assert_eq!(score.documentation, 0.0);
        assert!(score.composite < 60.0);
        assert_eq!(score.missing_required_fields.len(), 6);
        assert_eq!(score.recommendations.len(), 3);
        assert!(score.recommendations[0].starts_with("Complete the required fields"));
        assert!(score.recommendations[2].contains("default values"));
    }

    #[test]
    fn rating_bands() {
        assert_eq!(QualityRating::from_score(90.0), QualityRating::Excellent);
        assert_eq!(QualityRating::from_score(89.9), QualityRating::Good);
        assert_eq!(QualityRating::from_score(60.0), QualityRating::Acceptable);
        assert_eq!(QualityRating::from_score(40.0), QualityRating::Poor);
        assert_eq!(QualityRating::from_score(39.9), QualityRating::Critical);
    }
}
