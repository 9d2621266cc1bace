//! Combined input data and prediction result (X+Y)

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::input_item::HazmatInputItem;
use crate::model::prediction::HazmatPrediction;
use crate::model::traits::HazmatTrait;

/// The item IDs of an input and the prediction paired with it disagree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("item ID mismatch: input={input_item_id}, prediction={prediction_item_id}")]
pub struct MismatchedItemIdsError {
    pub input_item_id: String,
    pub prediction_item_id: String,
}

/// An input item together with its prediction, keyed by the shared `item_id`.
///
/// Useful for evaluation datasets and exports. Can only be constructed from
/// a matched (input, prediction) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazmatLabeledItem {
    // Input data fields
    pub item_id: String,
    pub name: String,
    pub domain_id: String,
    pub family_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,

    // Prediction fields
    pub is_hazmat: bool,
    #[serde(default)]
    pub traits: Vec<HazmatTrait>,
    pub reason: String,
}

impl HazmatLabeledItem {
    /// Combine an input item and its prediction.
    ///
    /// Fails with [`MismatchedItemIdsError`] if the IDs do not match.
    pub fn from_input_and_prediction(
        input_item: &HazmatInputItem,
        prediction: HazmatPrediction,
    ) -> Result<Self, MismatchedItemIdsError> {
        if input_item.item_id != prediction.item_id {
            return Err(MismatchedItemIdsError {
                input_item_id: input_item.item_id.clone(),
                prediction_item_id: prediction.item_id,
            });
        }

        Ok(Self {
            item_id: prediction.item_id,
            name: input_item.name.clone(),
            domain_id: input_item.domain_id.clone(),
            family_name: input_item.family_name.clone(),
            description: input_item.description.clone(),
            short_description: input_item.short_description.clone(),
            keywords: input_item.keywords.clone(),
            is_hazmat: prediction.is_hazmat,
            traits: prediction.traits,
            reason: prediction.reason,
        })
    }

    /// The input half of this record.
    pub fn input_item(&self) -> HazmatInputItem {
        HazmatInputItem {
            item_id: self.item_id.clone(),
            name: self.name.clone(),
            domain_id: self.domain_id.clone(),
            family_name: self.family_name.clone(),
            permalink: None,
            description: self.description.clone(),
            short_description: self.short_description.clone(),
            keywords: self.keywords.clone(),
            attributes: Vec::new(),
            main_features: Vec::new(),
        }
    }

    /// The prediction half of this record.
    pub fn prediction(&self) -> HazmatPrediction {
        HazmatPrediction {
            item_id: self.item_id.clone(),
            is_hazmat: self.is_hazmat,
            traits: self.traits.clone(),
            reason: self.reason.clone(),
        }
    }
}
