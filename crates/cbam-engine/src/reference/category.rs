use serde::{Deserialize, Serialize};

use crate::entries::FunctionalUnit;

/// CBAM goods families. Clinker is tracked apart from cement because it is declared per tonne of
/// clinker and carries its own benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoodsCategory {
    IronSteel,
    Aluminium,
    Cement,
    Clinker,
    Fertilisers,
    Hydrogen,
    Electricity,
}

impl GoodsCategory {
    pub const ALL: [GoodsCategory; 7] = [
        GoodsCategory::IronSteel,
        GoodsCategory::Aluminium,
        GoodsCategory::Cement,
        GoodsCategory::Clinker,
        GoodsCategory::Fertilisers,
        GoodsCategory::Hydrogen,
        GoodsCategory::Electricity,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            GoodsCategory::IronSteel => "Iron and steel",
            GoodsCategory::Aluminium => "Aluminium",
            GoodsCategory::Cement => "Cement",
            GoodsCategory::Clinker => "Cement clinker",
            GoodsCategory::Fertilisers => "Fertilisers",
            GoodsCategory::Hydrogen => "Hydrogen",
            GoodsCategory::Electricity => "Electricity",
        }
    }

    /// Unit the category is declared in when a table edition does not override it.
    pub const fn canonical_unit(self) -> FunctionalUnit {
        match self {
            GoodsCategory::Electricity => FunctionalUnit::MegawattHours,
            GoodsCategory::Fertilisers => FunctionalUnit::KilogramsNitrogen,
            GoodsCategory::Clinker => FunctionalUnit::TonnesClinker,
            _ => FunctionalUnit::Tonnes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_units_follow_category() {
        assert_eq!(
            GoodsCategory::Electricity.canonical_unit(),
            FunctionalUnit::MegawattHours
        );
        assert_eq!(
            GoodsCategory::Fertilisers.canonical_unit(),
            FunctionalUnit::KilogramsNitrogen
        );
        assert_eq!(
            GoodsCategory::Clinker.canonical_unit(),
            FunctionalUnit::TonnesClinker
        );
        assert_eq!(GoodsCategory::Cement.canonical_unit(), FunctionalUnit::Tonnes);
        assert_eq!(GoodsCategory::IronSteel.canonical_unit(), FunctionalUnit::Tonnes);
    }

    #[test]
    fn categories_serialize_as_snake_case() {
        let json = serde_json::to_string(&GoodsCategory::IronSteel).expect("serializes");
        assert_eq!(json, "\"iron_steel\"");
    }
}
