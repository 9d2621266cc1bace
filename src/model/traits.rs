//! Hazard trait vocabulary for classification results

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Known hazard categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum KnownHazmatTrait {
    // Physical hazards
    Flammable,
    Explosive,
    Oxidizing,
    Corrosive,
    CompressedGas,

    // Health hazards
    Toxic,
    Carcinogenic,
    Irritant,
    Sensitizing,
    Mutagenic,
    ReproductiveToxicity,

    // Environmental hazards
    AquaticToxicity,
    OzoneDepletion,

    // Special categories
    Radioactive,
    Infectious,
}

impl KnownHazmatTrait {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownHazmatTrait::Flammable => "flammable",
            KnownHazmatTrait::Explosive => "explosive",
            KnownHazmatTrait::Oxidizing => "oxidizing",
            KnownHazmatTrait::Corrosive => "corrosive",
            KnownHazmatTrait::CompressedGas => "compressed_gas",
            KnownHazmatTrait::Toxic => "toxic",
            KnownHazmatTrait::Carcinogenic => "carcinogenic",
            KnownHazmatTrait::Irritant => "irritant",
            KnownHazmatTrait::Sensitizing => "sensitizing",
            KnownHazmatTrait::Mutagenic => "mutagenic",
            KnownHazmatTrait::ReproductiveToxicity => "reproductive_toxicity",
            KnownHazmatTrait::AquaticToxicity => "aquatic_toxicity",
            KnownHazmatTrait::OzoneDepletion => "ozone_depletion",
            KnownHazmatTrait::Radioactive => "radioactive",
            KnownHazmatTrait::Infectious => "infectious",
        }
    }

    /// Parse a trait string from the known vocabulary.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "flammable" => Some(KnownHazmatTrait::Flammable),
            "explosive" => Some(KnownHazmatTrait::Explosive),
            "oxidizing" => Some(KnownHazmatTrait::Oxidizing),
            "corrosive" => Some(KnownHazmatTrait::Corrosive),
            "compressed_gas" => Some(KnownHazmatTrait::CompressedGas),
            "toxic" => Some(KnownHazmatTrait::Toxic),
            "carcinogenic" => Some(KnownHazmatTrait::Carcinogenic),
            "irritant" => Some(KnownHazmatTrait::Irritant),
            "sensitizing" => Some(KnownHazmatTrait::Sensitizing),
            "mutagenic" => Some(KnownHazmatTrait::Mutagenic),
            "reproductive_toxicity" => Some(KnownHazmatTrait::ReproductiveToxicity),
            "aquatic_toxicity" => Some(KnownHazmatTrait::AquaticToxicity),
            "ozone_depletion" => Some(KnownHazmatTrait::OzoneDepletion),
            "radioactive" => Some(KnownHazmatTrait::Radioactive),
            "infectious" => Some(KnownHazmatTrait::Infectious),
            _ => None,
        }
    }
}

/// A hazard trait attributed to an item.
///
/// Either a member of the known vocabulary or a free-form trait the model
/// reported outside of it. Serialized untagged: known traits as plain
/// strings, other traits as `{"trait": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum HazmatTrait {
    Known(KnownHazmatTrait),
    Other {
        #[serde(rename = "trait")]
        name: String,
    },
}

impl HazmatTrait {
    /// Parse a trait string, falling back to `Other` for anything outside
    /// the known vocabulary.
    pub fn parse(value: &str) -> Self {
        match KnownHazmatTrait::parse(value) {
            Some(known) => HazmatTrait::Known(known),
            None => HazmatTrait::Other {
                name: value.to_string(),
            },
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HazmatTrait::Known(known) => known.as_str(),
            HazmatTrait::Other { name } => name,
        }
    }
}

impl std::fmt::Display for HazmatTrait {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<KnownHazmatTrait> for HazmatTrait {
    fn from(known: KnownHazmatTrait) -> Self {
        HazmatTrait::Known(known)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_trait_round_trips_through_string() {
        for trait_str in ["flammable", "compressed_gas", "reproductive_toxicity"] {
            let parsed = HazmatTrait::parse(trait_str);
            assert!(matches!(parsed, HazmatTrait::Known(_)));
            assert_eq!(parsed.as_str(), trait_str);
        }
    }

    #[test]
    fn test_unknown_trait_falls_back_to_other() {
        let parsed = HazmatTrait::parse("magnetic");
        assert_eq!(
            parsed,
            HazmatTrait::Other {
                name: "magnetic".to_string()
            }
        );
        assert_eq!(parsed.as_str(), "magnetic");
    }

    #[test]
    fn test_serde_representation() {
        let known: HazmatTrait = KnownHazmatTrait::Flammable.into();
        assert_eq!(serde_json::to_string(&known).unwrap(), "\"flammable\"");

        let other = HazmatTrait::Other {
            name: "magnetic".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&other).unwrap(),
            "{\"trait\":\"magnetic\"}"
        );

        let back: HazmatTrait = serde_json::from_str("\"toxic\"").unwrap();
        assert_eq!(back, HazmatTrait::Known(KnownHazmatTrait::Toxic));

        let back: HazmatTrait = serde_json::from_str("{\"trait\":\"magnetic\"}").unwrap();
        assert_eq!(back, other);
    }
}
