//! Error types for the classification agent

use thiserror::Error;

use crate::model::MismatchedItemIdsError;

/// Error type for hazmat classification
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AgentError {
    #[error("failed to initialize LLM client: {0}")]
    ClientInit(String),

    #[error("LLM prediction failed: {0}")]
    PredictionFailed(String),

    #[error(transparent)]
    MismatchedItemIds(#[from] MismatchedItemIdsError),
}
