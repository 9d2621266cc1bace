//! Labeled-example stores for example-augmented classification

mod jsonl;

pub use jsonl::JsonlExampleStore;

use thiserror::Error;

use crate::model::{HazmatInputItem, HazmatLabeledItem};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("failed to read example store: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse example record: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Store of previously labeled examples, queried for items similar to the
/// one being classified.
pub trait ExampleStore: Send + Sync {
    /// Add a ground-truth example, replacing any existing entry with the
    /// same item ID.
    fn add(&mut self, example: HazmatLabeledItem);

    /// Retrieve up to `count` examples most similar to the given item,
    /// ordered by descending similarity.
    fn retrieve(&self, item: &HazmatInputItem, count: usize) -> Vec<HazmatLabeledItem>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
