use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entries::{present, EmissionEntry};

/// Deviation from the peer average above which an entry is material.
pub const MATERIALITY_THRESHOLD_PERCENT: f64 = 5.0;
/// Deviation above which a material entry needs verifier action.
pub const VERIFIER_ACTION_THRESHOLD_PERCENT: f64 = 10.0;
/// Share of material entries above which a CN code is reported as high risk.
pub const HIGH_RISK_MATERIAL_SHARE: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialityTag {
    NoComparisonAvailable,
    ZeroBaseline,
    MissingDirectEmissions,
    WithinThreshold,
    Material,
    MandatoryVerifierAction,
}

impl MaterialityTag {
    pub const fn label(self) -> &'static str {
        match self {
            MaterialityTag::NoComparisonAvailable => "no_comparison_available",
            MaterialityTag::ZeroBaseline => "zero_baseline",
            MaterialityTag::MissingDirectEmissions => "missing_direct_emissions",
            MaterialityTag::WithinThreshold => "within_threshold",
            MaterialityTag::Material => "material",
            MaterialityTag::MandatoryVerifierAction => "mandatory_verifier_action",
        }
    }

    /// Whether a comparison against peers was possible at all.
    pub const fn is_assessable(self) -> bool {
        matches!(
            self,
            MaterialityTag::WithinThreshold
                | MaterialityTag::Material
                | MaterialityTag::MandatoryVerifierAction
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialityAssessment {
    pub tag: MaterialityTag,
    pub is_material: bool,
    pub assessable: bool,
    pub requires_verifier_action: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation_percent: Option<f64>,
    pub peer_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_average: Option<f64>,
    pub threshold_percent: f64,
}

impl MaterialityAssessment {
    fn not_assessable(tag: MaterialityTag, peer_count: usize, peer_average: Option<f64>) -> Self {
        Self {
            tag,
            is_material: false,
            assessable: false,
            requires_verifier_action: false,
            deviation_percent: None,
            peer_count,
            peer_average,
            threshold_percent: MATERIALITY_THRESHOLD_PERCENT,
        }
    }
}

/// Compares an entry's direct intensity with the average of the other entries sharing its CN
/// code. `peers` may contain the entry itself; it is skipped by identity or by id.
pub fn assess_materiality(entry: &EmissionEntry, peers: &[EmissionEntry]) -> MaterialityAssessment {
    assess_against(
        entry,
        peers.iter().filter(|peer| !is_same_entry(entry, peer)),
    )
}

/// Assesses `batch[position]` against every other position of the batch. Entries sharing an id
/// with the focal entry stay in its cohort.
pub(crate) fn assess_in_batch(batch: &[EmissionEntry], position: usize) -> MaterialityAssessment {
    let Some(entry) = batch.get(position) else {
        return MaterialityAssessment::not_assessable(MaterialityTag::NoComparisonAvailable, 0, None);
    };
    assess_against(
        entry,
        batch
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != position)
            .map(|(_, peer)| peer),
    )
}

fn assess_against<'a>(
    entry: &EmissionEntry,
    peers: impl Iterator<Item = &'a EmissionEntry>,
) -> MaterialityAssessment {
    let Some(code) = entry.normalized_cn_code() else {
        return MaterialityAssessment::not_assessable(MaterialityTag::NoComparisonAvailable, 0, None);
    };

    let intensities: Vec<f64> = peers
        .filter(|peer| peer.normalized_cn_code() == Some(code))
        .filter_map(|peer| peer.direct_emissions_specific)
        .filter(|value| value.is_finite())
        .collect();

    if intensities.is_empty() {
        return MaterialityAssessment::not_assessable(MaterialityTag::NoComparisonAvailable, 0, None);
    }

    let peer_count = intensities.len();
    let peer_average = intensities.iter().sum::<f64>() / peer_count as f64;

    let Some(direct) = entry.direct_emissions_specific else {
        return MaterialityAssessment::not_assessable(
            MaterialityTag::MissingDirectEmissions,
            peer_count,
            Some(peer_average),
        );
    };
    if peer_average == 0.0 {
        return MaterialityAssessment::not_assessable(
            MaterialityTag::ZeroBaseline,
            peer_count,
            Some(peer_average),
        );
    }

    let deviation_percent = (direct - peer_average).abs() / peer_average * 100.0;
    let is_material = deviation_percent > MATERIALITY_THRESHOLD_PERCENT;
    let requires_verifier_action = is_material && deviation_percent > VERIFIER_ACTION_THRESHOLD_PERCENT;
    let tag = if requires_verifier_action {
        MaterialityTag::MandatoryVerifierAction
    } else if is_material {
        MaterialityTag::Material
    } else {
        MaterialityTag::WithinThreshold
    };

    MaterialityAssessment {
        tag,
        is_material,
        assessable: true,
        requires_verifier_action,
        deviation_percent: Some(deviation_percent),
        peer_count,
        peer_average: Some(peer_average),
        threshold_percent: MATERIALITY_THRESHOLD_PERCENT,
    }
}

fn is_same_entry(entry: &EmissionEntry, peer: &EmissionEntry) -> bool {
    if std::ptr::eq(entry, peer) {
        return true;
    }
    matches!((present(&entry.id), present(&peer.id)), (Some(a), Some(b)) if a == b)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMateriality {
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cn_code: Option<String>,
    pub assessment: MaterialityAssessment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeMateriality {
    pub cn_code: String,
    pub entries: usize,
    pub material: usize,
    pub not_assessable: usize,
    pub material_share: f64,
    pub high_risk: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialityReport {
    pub assessments: Vec<EntryMateriality>,
    pub by_code: Vec<CodeMateriality>,
    pub high_risk_codes: Vec<String>,
    pub material_count: usize,
    pub not_assessable_count: usize,
}

/// Assesses every entry against the whole batch and groups the outcome by CN code.
pub fn assess_materiality_batch(entries: &[EmissionEntry]) -> MaterialityReport {
    let assessments: Vec<EntryMateriality> = entries
        .iter()
        .enumerate()
        .map(|(position, entry)| EntryMateriality {
            reference: entry.reference(position),
            cn_code: entry.normalized_cn_code().map(str::to_string),
            assessment: assess_in_batch(entries, position),
        })
        .collect();
    summarize(assessments)
}

pub(crate) fn summarize(assessments: Vec<EntryMateriality>) -> MaterialityReport {
    let mut groups: BTreeMap<&str, (usize, usize, usize)> = BTreeMap::new();
    for item in &assessments {
        let Some(code) = item.cn_code.as_deref() else {
            continue;
        };
        let counts = groups.entry(code).or_default();
        counts.0 += 1;
        if item.assessment.is_material {
            counts.1 += 1;
        }
        if !item.assessment.assessable {
            counts.2 += 1;
        }
    }

    let by_code: Vec<CodeMateriality> = groups
        .into_iter()
        .map(|(code, (total, material, not_assessable))| {
            let material_share = material as f64 / total as f64;
            CodeMateriality {
                cn_code: code.to_string(),
                entries: total,
                material,
                not_assessable,
                material_share,
                high_risk: material_share > HIGH_RISK_MATERIAL_SHARE,
            }
        })
        .collect();

    let high_risk_codes = by_code
        .iter()
        .filter(|group| group.high_risk)
        .map(|group| group.cn_code.clone())
        .collect();
    let material_count = assessments
        .iter()
        .filter(|item| item.assessment.is_material)
        .count();
    let not_assessable_count = assessments
        .iter()
        .filter(|item| !item.assessment.assessable)
        .count();

    MaterialityReport {
        assessments,
        by_code,
        high_risk_codes,
        material_count,
        not_assessable_count,
    }
}
