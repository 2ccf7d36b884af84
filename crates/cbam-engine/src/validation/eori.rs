use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::reference::ReferenceTables;

/// Weights of the Dutch modulo-11 check over the first nine digits.
const NL_CHECK_WEIGHTS: [i64; 9] = [9, 8, 7, 6, 5, 4, 3, 2, -1];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EoriFailure {
    #[error("EORI must be 2 letters followed by 1 to 15 alphanumeric characters")]
    InvalidFormat,
    #[error("{country} is not an EU member state")]
    NotEuCountry { country: String },
    #[error("EORI does not match the {country} pattern ({expected})")]
    CountryPatternMismatch {
        country: String,
        expected: String,
    },
    #[error("EORI check digit is invalid for {country}")]
    ChecksumMismatch { country: String },
    #[error("EORI is issued by {actual}, expected {expected}")]
    MemberStateMismatch { expected: String, actual: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumStatus {
    Valid,
    Failed,
    /// No checksum rule is known for the issuing country.
    NotValidated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EoriResult {
    pub input: String,
    pub normalized: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    pub checksum: ChecksumStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<EoriFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl EoriResult {
    fn rejected(mut self, failure: EoriFailure) -> Self {
        self.valid = false;
        self.message = Some(failure.to_string());
        self.failure = Some(failure);
        self
    }
}

/// EORI grammar check with country patterns.
///
/// Checksums are advisory unless `enforce_checksum` is set: a failed check digit is reported in
/// [`EoriResult::checksum`] but does not reject the identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct EoriValidator {
    pub enforce_checksum: bool,
}

impl EoriValidator {
    pub fn strict() -> Self {
        Self {
            enforce_checksum: true,
        }
    }

    pub fn validate(&self, tables: &ReferenceTables, identifier: &str) -> EoriResult {
        let normalized = normalize(identifier);
        let result = EoriResult {
            input: identifier.to_string(),
            normalized: normalized.clone(),
            valid: true,
            country_code: None,
            checksum: ChecksumStatus::NotValidated,
            failure: None,
            message: None,
        };

        if !grammar_ok(&normalized) {
            return result.rejected(EoriFailure::InvalidFormat);
        }
        let (country, body) = normalized.split_at(2);
        let mut result = EoriResult {
            country_code: Some(country.to_string()),
            ..result
        };

        if !tables.is_eu_member(country) {
            return result.rejected(EoriFailure::NotEuCountry {
                country: country.to_string(),
            });
        }

        if let Some((matches, expected)) = country_pattern(country, body) {
            if !matches {
                return result.rejected(EoriFailure::CountryPatternMismatch {
                    country: country.to_string(),
                    expected: expected.to_string(),
                });
            }
        }

        result.checksum = checksum(country, body);
        if self.enforce_checksum && result.checksum == ChecksumStatus::Failed {
            return result.rejected(EoriFailure::ChecksumMismatch {
                country: country.to_string(),
            });
        }
        result
    }

    /// [`EoriValidator::validate`] plus a check that the identifier was issued by `member_state`.
    pub fn validate_for_member_state(
        &self,
        tables: &ReferenceTables,
        identifier: &str,
        member_state: &str,
    ) -> EoriResult {
        let result = self.validate(tables, identifier);
        if !result.valid {
            return result;
        }
        let expected = member_state.trim().to_ascii_uppercase();
        match result.country_code.clone() {
            Some(actual) if actual != expected => {
                result.rejected(EoriFailure::MemberStateMismatch { expected, actual })
            }
            _ => result,
        }
    }

    /// Validates each identifier, against `member_state` when given, and groups failures by message.
    pub fn validate_batch<S: AsRef<str>>(
        &self,
        tables: &ReferenceTables,
        identifiers: &[S],
        member_state: Option<&str>,
    ) -> EoriBatchReport {
        let results: Vec<EoriResult> = identifiers
            .iter()
            .map(|identifier| match member_state {
                Some(state) => self.validate_for_member_state(tables, identifier.as_ref(), state),
                None => self.validate(tables, identifier.as_ref()),
            })
            .collect();

        let mut failures_by_message: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for result in results.iter().filter(|result| !result.valid) {
            if let Some(message) = &result.message {
                failures_by_message
                    .entry(message.clone())
                    .or_default()
                    .push(result.normalized.clone());
            }
        }

        let valid = results.iter().filter(|result| result.valid).count();
        EoriBatchReport {
            total: results.len(),
            valid,
            invalid: results.len() - valid,
            results,
            failures_by_message,
        }
    }
}

pub fn validate_eori(tables: &ReferenceTables, identifier: &str) -> EoriResult {
    EoriValidator::default().validate(tables, identifier)
}

/// Validates an EORI and requires it to be issued by the declarant's member state.
pub fn validate_for_cbam(tables: &ReferenceTables, identifier: &str, member_state: &str) -> EoriResult {
    EoriValidator::default().validate_for_member_state(tables, identifier, member_state)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EoriBatchReport {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub results: Vec<EoriResult>,
    /// Failure message to the normalized identifiers that produced it.
    pub failures_by_message: BTreeMap<String, Vec<String>>,
}

pub fn validate_eori_batch<S: AsRef<str>>(tables: &ReferenceTables, identifiers: &[S]) -> EoriBatchReport {
    EoriValidator::default().validate_batch(tables, identifiers, None)
}

fn normalize(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

fn grammar_ok(normalized: &str) -> bool {
    let bytes = normalized.as_bytes();
    bytes.len() >= 3
        && bytes.len() <= 17
        && bytes[..2].iter().all(u8::is_ascii_uppercase)
        && bytes[2..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

fn digits(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_digit())
}

fn letters(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_uppercase())
}

/// Country-specific body pattern, if one is known: `(matches, description)`.
fn country_pattern(country: &str, body: &str) -> Option<(bool, &'static str)> {
    let len = body.len();
    let pattern = match country {
        "NL" => ((len == 9 || len == 12) && digits(body), "9 or 12 digits"),
        "DE" => (len == 10 && digits(body), "10 digits"),
        "BE" => (len == 10 && digits(body), "10 digits"),
        "IT" => (len == 11 && digits(body), "11 digits"),
        "FR" => (
            len == 11 && letters(&body[..2]) && digits(&body[2..]),
            "2 letters and 9 digits",
        ),
        "ES" => {
            let with_letter_prefix =
                len == 9 && letters(&body[..1]) && digits(&body[1..8]) && letters(&body[8..]);
            let digits_then_letter = len == 9 && digits(&body[..8]) && letters(&body[8..]);
            (
                with_letter_prefix || digits_then_letter,
                "letter, 7 digits and letter, or 8 digits and letter",
            )
        }
        _ => return None,
    };
    Some(pattern)
}

fn checksum(country: &str, body: &str) -> ChecksumStatus {
    match country {
        "NL" => {
            let sum: i64 = body
                .bytes()
                .take(9)
                .zip(NL_CHECK_WEIGHTS)
                .map(|(digit, weight)| i64::from(digit - b'0') * weight)
                .sum();
            if sum.rem_euclid(11) == 0 {
                ChecksumStatus::Valid
            } else {
                ChecksumStatus::Failed
            }
        }
        _ => ChecksumStatus::NotValidated,
    }
}
