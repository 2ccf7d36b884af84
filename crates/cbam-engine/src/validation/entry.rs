use super::{citation, IssueKind, ValidationIssue, ValidationResult};
use crate::entries::{present, CalculationMethod, EmissionEntry};
use crate::reference::{ReferenceTables, REGIME_START_YEAR};

/// Tolerance, in percentage points, between a stored and the expected free-allocation percentage.
const FREE_ALLOCATION_TOLERANCE: f64 = 0.1;

const ENGLISH: [&str; 3] = ["en", "eng", "english"];

/// Field-level rule check of one entry. Every rule runs; issues accumulate in rule order.
pub fn validate_entry(tables: &ReferenceTables, entry: &EmissionEntry) -> ValidationResult {
    let mut issues = Vec::new();

    check_cn_code(entry, &mut issues);
    check_reporting_year(entry, &mut issues);
    check_functional_unit(entry, &mut issues);
    check_declarant(entry, &mut issues);
    check_quantities(entry, &mut issues);
    check_method_requirements(entry, &mut issues);
    check_documents(entry, &mut issues);
    check_free_allocation(tables, entry, &mut issues);

    let result = ValidationResult::from_issues(issues);
    tracing::debug!(
        cn_code = ?entry.normalized_cn_code(),
        errors = result.error_count,
        warnings = result.warning_count,
        "validated entry"
    );
    result
}

/// Two letters followed by 12 to 15 alphanumerics.
pub(crate) fn entry_eori_format_ok(eori: &str) -> bool {
    let eori = eori.trim();
    let (prefix, body) = match (eori.get(..2), eori.get(2..)) {
        (Some(prefix), Some(body)) => (prefix, body),
        _ => return false,
    };
    prefix.chars().all(|c| c.is_ascii_alphabetic())
        && (12..=15).contains(&body.len())
        && body.chars().all(|c| c.is_ascii_alphanumeric())
}

fn check_cn_code(entry: &EmissionEntry, issues: &mut Vec<ValidationIssue>) {
    let Some(code) = entry.normalized_cn_code() else {
        issues.push(
            ValidationIssue::error(
                IssueKind::MissingRequiredField,
                "cn_code",
                "CN code is required",
            )
            .cite(citation::GOODS_LIST),
        );
        return;
    };

    if code.chars().count() != 8 {
        issues.push(
            ValidationIssue::error(
                IssueKind::InvalidFormat,
                "cn_code",
                format!("CN code must be exactly 8 digits, got {}", code.chars().count()),
            )
            .cite(citation::GOODS_LIST),
        );
    } else if !code.chars().all(|c| c.is_ascii_digit()) {
        issues.push(
            ValidationIssue::error(
                IssueKind::InvalidFormat,
                "cn_code",
                "CN code must contain digits only",
            )
            .cite(citation::GOODS_LIST),
        );
    }
}

fn check_reporting_year(entry: &EmissionEntry, issues: &mut Vec<ValidationIssue>) {
    match entry.reporting_year {
        None => issues.push(ValidationIssue::error(
            IssueKind::MissingRequiredField,
            "reporting_year",
            "reporting year is required",
        )),
        Some(year) if year < REGIME_START_YEAR => issues.push(
            ValidationIssue::error(
                IssueKind::OutOfRange,
                "reporting_year",
                format!("reporting year {year} is before the definitive period ({REGIME_START_YEAR})"),
            )
            .cite(citation::DEFINITIVE_PERIOD),
        ),
        Some(_) => {}
    }
}

fn check_functional_unit(entry: &EmissionEntry, issues: &mut Vec<ValidationIssue>) {
    let Some(raw) = present(&entry.functional_unit) else {
        issues.push(ValidationIssue::error(
            IssueKind::MissingRequiredField,
            "functional_unit",
            "functional unit is required",
        ));
        return;
    };
    if entry.parsed_unit().is_none() {
        issues.push(ValidationIssue::error(
            IssueKind::InvalidFormat,
            "functional_unit",
            format!("unrecognized functional unit \"{raw}\""),
        ));
    }
}

fn check_declarant(entry: &EmissionEntry, issues: &mut Vec<ValidationIssue>) {
    if let Some(eori) = present(&entry.declarant_eori) {
        if !entry_eori_format_ok(eori) {
            issues.push(
                ValidationIssue::error(
                    IssueKind::InvalidFormat,
                    "declarant_eori",
                    "EORI must be 2 letters followed by 12 to 15 alphanumeric characters",
                )
                .cite(citation::DECLARANT),
            );
        }
    }

    if present(&entry.country_of_origin).is_none() {
        issues.push(ValidationIssue::error(
            IssueKind::MissingRequiredField,
            "country_of_origin",
            "country of origin is required",
        ));
    }
}

fn check_quantities(entry: &EmissionEntry, issues: &mut Vec<ValidationIssue>) {
    match entry.quantity {
        None => issues.push(ValidationIssue::error(
            IssueKind::MissingRequiredField,
            "quantity",
            "quantity is required",
        )),
        Some(quantity) if !(quantity > 0.0) => issues.push(ValidationIssue::error(
            IssueKind::OutOfRange,
            "quantity",
            "quantity must be greater than zero",
        )),
        Some(_) => {}
    }

    match entry.direct_emissions_specific {
        None => issues.push(
            ValidationIssue::error(
                IssueKind::MissingRequiredField,
                "direct_emissions_specific",
                "direct emission intensity is required",
            )
            .cite(citation::EMBEDDED_EMISSIONS),
        ),
        Some(direct) if !(direct > 0.0) => issues.push(
            ValidationIssue::error(
                IssueKind::OutOfRange,
                "direct_emissions_specific",
                "direct emission intensity must be greater than zero",
            )
            .cite(citation::EMBEDDED_EMISSIONS),
        ),
        Some(_) => {}
    }

    if let Some(indirect) = entry.indirect_emissions_specific {
        if !(indirect >= 0.0) {
            issues.push(ValidationIssue::error(
                IssueKind::OutOfRange,
                "indirect_emissions_specific",
                "indirect emission intensity must not be negative",
            ));
        }
    }
}

fn check_method_requirements(entry: &EmissionEntry, issues: &mut Vec<ValidationIssue>) {
    let Some(method) = entry.calculation_method else {
        return;
    };

    if method == CalculationMethod::DefaultValues && present(&entry.production_route).is_none() {
        issues.push(
            ValidationIssue::error(
                IssueKind::RegulatoryRuleViolation,
                "production_route",
                "production route is required when default values are used",
            )
            .cite(citation::EMBEDDED_EMISSIONS),
        );
    }

    if method.uses_actual_values() {
        if present(&entry.installation_id).is_none() {
            issues.push(
                ValidationIssue::error(
                    IssueKind::MissingRequiredField,
                    "installation_id",
                    format!("installation identifier is required for {}", method.label()),
                )
                .cite(citation::EMBEDDED_EMISSIONS),
            );
        }
        if present(&entry.monitoring_plan_ref).is_none() {
            issues.push(
                ValidationIssue::error(
                    IssueKind::MissingRequiredField,
                    "monitoring_plan_ref",
                    format!("approved monitoring plan is required for {}", method.label()),
                )
                .cite(citation::EMBEDDED_EMISSIONS),
            );
        }
        if entry.uses_default_values {
            issues.push(ValidationIssue::warning(
                IssueKind::CrossFieldInconsistency,
                "uses_default_values",
                format!("default values flagged on an entry declared with {}", method.label()),
            ));
        }
    }
}

fn check_documents(entry: &EmissionEntry, issues: &mut Vec<ValidationIssue>) {
    if entry.has_carbon_price() && present(&entry.carbon_price_proof).is_none() {
        issues.push(
            ValidationIssue::error(
                IssueKind::RegulatoryRuleViolation,
                "carbon_price_proof",
                "proof of the carbon price paid in the country of origin is required",
            )
            .cite(citation::CARBON_PRICE),
        );
    }

    if let Some(language) = present(&entry.document_language) {
        if !ENGLISH.contains(&language.to_ascii_lowercase().as_str()) {
            issues.push(
                ValidationIssue::error(
                    IssueKind::RegulatoryRuleViolation,
                    "document_language",
                    format!("supporting documents must be in English, got \"{language}\""),
                )
                .cite(citation::VERIFICATION),
            );
        }
    }

    if present(&entry.customs_declaration_ref).is_none() {
        issues.push(ValidationIssue::warning(
            IssueKind::MissingRequiredField,
            "customs_declaration_ref",
            "customs declaration reference is recommended",
        ));
    }
}

fn check_free_allocation(
    tables: &ReferenceTables,
    entry: &EmissionEntry,
    issues: &mut Vec<ValidationIssue>,
) {
    let year = entry.reporting_year.unwrap_or(REGIME_START_YEAR);

    if let Some(stored) = entry.free_allocation_percent {
        let expected = (1.0 - tables.cbam_factor(year)) * 100.0;
        if (stored - expected).abs() > FREE_ALLOCATION_TOLERANCE {
            issues.push(
                ValidationIssue::warning(
                    IssueKind::CrossFieldInconsistency,
                    "free_allocation_percent",
                    format!("stored free allocation {stored:.2}% differs from {expected:.2}% expected for {year}"),
                )
                .cite(citation::FREE_ALLOCATION),
            );
        }
    }

    let indirect_declared = entry
        .indirect_emissions_specific
        .map_or(false, |indirect| indirect > 0.0);
    if indirect_declared && entry.calculation_method == Some(CalculationMethod::DefaultValues) {
        if let Some(category) = entry.normalized_cn_code().and_then(|code| tables.classify(code)) {
            if !tables.is_annex_ii(category) {
                issues.push(
                    ValidationIssue::warning(
                        IssueKind::RegulatoryRuleViolation,
                        "indirect_emissions_specific",
                        format!(
                            "default values for {} exclude indirect emissions",
                            category.label()
                        ),
                    )
                    .cite(citation::EMBEDDED_EMISSIONS),
                );
            }
        }
    }
}
