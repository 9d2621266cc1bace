//! LLM-extractable prediction models (Y only)

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::traits::HazmatTrait;

/// Classification result for a single item.
///
/// Carries only the model's judgment; the `item_id` pairs the prediction
/// with its input and is the load-bearing correlation key of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HazmatPrediction {
    /// Item ID echoed by the model to pair the prediction with its input.
    pub item_id: String,
    /// Whether the item is classified as hazmat.
    pub is_hazmat: bool,
    /// Identified hazard traits, empty if the item is not hazmat.
    #[serde(default)]
    pub traits: Vec<HazmatTrait>,
    /// Free-text justification for the classification.
    pub reason: String,
}

/// Wrapper for batch extraction, one prediction per input item.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedPredictions {
    pub predictions: Vec<HazmatPrediction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::traits::KnownHazmatTrait;

    #[test]
    fn test_prediction_json_round_trip() {
        let prediction = HazmatPrediction {
            item_id: "MLB42".to_string(),
            is_hazmat: true,
            traits: vec![
                KnownHazmatTrait::Flammable.into(),
                HazmatTrait::Other {
                    name: "magnetic".to_string(),
                },
            ],
            reason: "Contains acetone, a highly flammable liquid".to_string(),
        };

        let json = serde_json::to_string(&prediction).unwrap();
        let back: HazmatPrediction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, prediction);
    }

    #[test]
    fn test_traits_default_to_empty() {
        let prediction: HazmatPrediction = serde_json::from_str(
            r#"{"item_id":"MLB1","is_hazmat":false,"reason":"No hazardous ingredients"}"#,
        )
        .unwrap();
        assert!(prediction.traits.is_empty());
    }
}
