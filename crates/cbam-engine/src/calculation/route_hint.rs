//! Best-effort production route guess from free-text descriptors.
//!
//! Suggestions are advisory. Resolution only ever uses the route the caller declares (or the
//! category default), never a suggestion.

use serde::{Deserialize, Serialize};

use crate::reference::{GoodsCategory, ReferenceTables};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSuggestion {
    pub route: String,
    pub reason: String,
}

struct KeywordRule {
    category: GoodsCategory,
    keywords: &'static [&'static str],
    route: &'static str,
}

const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        category: GoodsCategory::IronSteel,
        keywords: &["scrap", "eaf", "electric arc", "recycled"],
        route: "scrap_eaf_route",
    },
    KeywordRule {
        category: GoodsCategory::IronSteel,
        keywords: &["dri", "direct reduced", "hbi", "sponge iron"],
        route: "dri_eaf_route",
    },
    KeywordRule {
        category: GoodsCategory::IronSteel,
        keywords: &["blast furnace", "bof", "basic oxygen"],
        route: "bf_bof_route",
    },
    KeywordRule {
        category: GoodsCategory::Aluminium,
        keywords: &["secondary", "recycled", "remelted", "remelt", "scrap"],
        route: "secondary_remelting",
    },
    KeywordRule {
        category: GoodsCategory::Aluminium,
        keywords: &["primary", "smelter", "smelted"],
        route: "primary_smelting",
    },
    KeywordRule {
        category: GoodsCategory::Cement,
        keywords: &["blended", "composite", "slag", "pozzolanic", "fly ash"],
        route: "blended_cement",
    },
    KeywordRule {
        category: GoodsCategory::Clinker,
        keywords: &["white"],
        route: "white_clinker",
    },
    KeywordRule {
        category: GoodsCategory::Fertilisers,
        keywords: &["coal"],
        route: "haber_bosch_coal",
    },
    KeywordRule {
        category: GoodsCategory::Fertilisers,
        keywords: &["abated", "abatement"],
        route: "nitric_acid_abated",
    },
    KeywordRule {
        category: GoodsCategory::Hydrogen,
        keywords: &[
            "electrolysis",
            "electrolytic",
            "electrolyser",
            "electrolyzer",
            "green",
        ],
        route: "electrolysis",
    },
    KeywordRule {
        category: GoodsCategory::Hydrogen,
        keywords: &["coal", "gasification"],
        route: "coal_gasification",
    },
    KeywordRule {
        category: GoodsCategory::Electricity,
        keywords: &[
            "solar",
            "wind",
            "hydro",
            "hydroelectric",
            "photovoltaic",
            "renewable",
        ],
        route: "renewable",
    },
    KeywordRule {
        category: GoodsCategory::Electricity,
        keywords: &["coal", "lignite", "fossil", "gas fired"],
        route: "fossil_fired",
    },
];

/// Primary route assumed for goods from high-carbon origins.
const fn primary_route(category: GoodsCategory) -> Option<&'static str> {
    match category {
        GoodsCategory::IronSteel => Some("bf_bof_route"),
        GoodsCategory::Aluminium => Some("primary_smelting"),
        _ => None,
    }
}

/// Guesses a production route from the product description and origin country.
///
/// Description keywords win over the origin heuristic. Only routes with a benchmark in `tables`
/// are suggested.
pub fn suggest_route(
    tables: &ReferenceTables,
    category: GoodsCategory,
    description: Option<&str>,
    country: Option<&str>,
) -> Option<RouteSuggestion> {
    let known = tables.routes_for(category);

    if let Some(text) = description {
        let words = normalize(text);
        for rule in KEYWORD_RULES
            .iter()
            .filter(|rule| rule.category == category && known.contains(&rule.route))
        {
            if let Some(keyword) = rule
                .keywords
                .iter()
                .find(|keyword| mentions(&words, keyword))
            {
                return Some(RouteSuggestion {
                    route: rule.route.to_string(),
                    reason: format!("description mentions \"{keyword}\""),
                });
            }
        }
    }

    let country = country.map(str::trim).filter(|c| !c.is_empty())?;
    let route = primary_route(category).filter(|route| known.contains(route))?;
    if tables.is_high_carbon_origin(country) {
        return Some(RouteSuggestion {
            route: route.to_string(),
            reason: format!(
                "origin {} is in the high-carbon markup tier",
                country.to_ascii_uppercase()
            ),
        });
    }
    None
}

/// Lowercased words padded with spaces so phrases match on word boundaries.
fn normalize(text: &str) -> String {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect();
    format!(" {} ", words.join(" "))
}

fn mentions(words: &str, keyword: &str) -> bool {
    words.contains(&format!(" {keyword} "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrap_and_eaf_tokens_suggest_secondary_steel() {
        let tables = ReferenceTables::builtin();
        let suggestion = suggest_route(
            &tables,
            GoodsCategory::IronSteel,
            Some("Hot-rolled coil, EAF (100% scrap)"),
            Some("CN"),
        )
        .expect("suggestion");
        assert_eq!(suggestion.route, "scrap_eaf_route");
        assert!(suggestion.reason.contains("scrap"));
    }

    #[test]
    fn keywords_match_whole_words_only() {
        let tables = ReferenceTables::builtin();
        let suggestion = suggest_route(
            &tables,
            GoodsCategory::IronSteel,
            Some("leaf springs, dried"),
            None,
        );
        assert_eq!(suggestion, None);
    }

    #[test]
    fn high_carbon_origin_suggests_primary_route() {
        let tables = ReferenceTables::builtin();
        let suggestion = suggest_route(&tables, GoodsCategory::IronSteel, Some("flat bar"), Some("in"))
            .expect("suggestion");
        assert_eq!(suggestion.route, "bf_bof_route");
        assert!(suggestion.reason.contains("IN"));

        assert_eq!(
            suggest_route(&tables, GoodsCategory::IronSteel, None, Some("NO")),
            None
        );
    }

    #[test]
    fn electricity_sources_map_to_routes() {
        let tables = ReferenceTables::builtin();
        let solar = suggest_route(&tables, GoodsCategory::Electricity, Some("Solar PV park"), None)
            .expect("solar");
        assert_eq!(solar.route, "renewable");
        let gas = suggest_route(&tables, GoodsCategory::Electricity, Some("gas-fired CCGT"), None)
            .expect("gas");
        assert_eq!(gas.route, "fossil_fired");
    }

    #[test]
    fn categories_without_origin_rule_return_none() {
        let tables = ReferenceTables::builtin();
        assert_eq!(
            suggest_route(&tables, GoodsCategory::Cement, Some("bagged"), Some("CN")),
            None
        );
    }
}
