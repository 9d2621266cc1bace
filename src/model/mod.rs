pub mod config;
pub mod input_item;
pub mod labeled_item;
pub mod prediction;
pub mod traits;

pub use config::{BatchConfig, Config};
pub use input_item::{HazmatInputItem, ItemAttribute, ItemMainFeature, PromptOptions};
pub use labeled_item::{HazmatLabeledItem, MismatchedItemIdsError};
pub use prediction::{ExtractedPredictions, HazmatPrediction};
pub use traits::{HazmatTrait, KnownHazmatTrait};
