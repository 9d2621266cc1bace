//! Hazmat classification agent backed by an LLM
//!
//! Renders product prompts, runs structured extraction through rig, and
//! pairs predictions back with their inputs.

use std::collections::HashMap;
use std::sync::Arc;

use rig::client::CompletionClient;

use crate::agent::prompts::{build_batch_prompt, build_item_prompt, format_examples, system_prompt};
use crate::model::{
    ExtractedPredictions, HazmatInputItem, HazmatLabeledItem, HazmatPrediction,
    MismatchedItemIdsError, PromptOptions,
};
use crate::store::ExampleStore;

pub mod error;
pub mod llm;
pub mod prompts;

pub use error::AgentError;
pub use llm::LlmClient;

/// Number of similar examples injected into a prompt when a store is available.
const EXAMPLES_PER_PROMPT: usize = 3;

/// Policy for a single-item prediction whose echoed ID differs from the
/// requested one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnDifferentId {
    /// Fail with [`MismatchedItemIdsError`].
    #[default]
    Raise,
    /// Overwrite the prediction's ID with the requested one.
    Fix,
    /// Keep the prediction as returned.
    Ignore,
}

/// Agent for hazmat classification with optional example-augmented prompts.
pub struct HazmatAgent {
    llm_client: LlmClient,
    model: String,
    example_store: Option<Arc<dyn ExampleStore>>,
}

impl HazmatAgent {
    /// Create an agent from a shared LLM client and model name.
    ///
    /// When an example store is provided, similar previously labeled items
    /// are injected into every prompt.
    pub fn new(
        llm_client: LlmClient,
        model: impl Into<String>,
        example_store: Option<Arc<dyn ExampleStore>>,
    ) -> Self {
        let model = model.into();
        tracing::info!(
            model = %model,
            rag_enabled = example_store.is_some(),
            "Hazmat classification agent initialized"
        );
        Self {
            llm_client,
            model,
            example_store,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Render the user prompt for a single item, including any retrieved
    /// examples.
    pub fn render_item_prompt(&self, item: &HazmatInputItem, options: PromptOptions) -> String {
        let prompt = build_item_prompt(item, options);
        self.prepend_examples(prompt, std::slice::from_ref(item))
    }

    /// Render the user prompt for a batch of items, including any retrieved
    /// examples.
    ///
    /// Deterministic given the same items and options, so the rendered
    /// length can be used for token budgeting before dispatch.
    pub fn render_batch_prompt(&self, items: &[HazmatInputItem], options: PromptOptions) -> String {
        let prompt = build_batch_prompt(items, options);
        self.prepend_examples(prompt, items)
    }

    fn prepend_examples(&self, prompt: String, items: &[HazmatInputItem]) -> String {
        let examples = self.examples_for(items);
        if examples.is_empty() {
            return prompt;
        }
        format!(
            "Here are previously classified products similar to the items under analysis:\n\n{}\n\n{prompt}",
            format_examples(&examples)
        )
    }

    /// Retrieve similar examples for a set of items, deduplicated by ID.
    fn examples_for(&self, items: &[HazmatInputItem]) -> Vec<HazmatLabeledItem> {
        let Some(store) = self.example_store.as_deref() else {
            return Vec::new();
        };

        let per_item = EXAMPLES_PER_PROMPT.div_ceil(items.len().max(1)).max(1);
        let mut seen = std::collections::HashSet::new();
        let mut examples = Vec::new();
        for item in items {
            if examples.len() >= EXAMPLES_PER_PROMPT {
                break;
            }
            for example in store.retrieve(item, per_item) {
                if examples.len() >= EXAMPLES_PER_PROMPT {
                    break;
                }
                if seen.insert(example.item_id.clone()) {
                    examples.push(example);
                }
            }
        }

        if !examples.is_empty() {
            tracing::debug!(
                example_count = examples.len(),
                item_count = items.len(),
                "Fetched similar examples for prompt"
            );
        }
        examples
    }

    async fn run_extraction<T>(&self, prompt: &str) -> Result<T, AgentError>
    where
        T: schemars::JsonSchema
            + for<'de> serde::Deserialize<'de>
            + serde::Serialize
            + Send
            + Sync
            + 'static,
    {
        let extractor = self
            .llm_client
            .openai_client()
            .extractor::<T>(&self.model)
            .preamble(&system_prompt(self.example_store.is_some()))
            .additional_params(serde_json::json!({
                "temperature": 0.0,
                "seed": 42
            }))
            .build();

        extractor
            .extract(prompt)
            .await
            .map_err(|e| AgentError::PredictionFailed(e.to_string()))
    }

    /// Predict hazmat classification for a single item.
    pub async fn predict_item(
        &self,
        item: &HazmatInputItem,
        options: PromptOptions,
        on_different_id: OnDifferentId,
    ) -> Result<HazmatPrediction, AgentError> {
        let prompt = self.render_item_prompt(item, options);
        let prompt_length = prompt.len();
        let start_time = std::time::Instant::now();

        tracing::debug!(
            item_id = %item.item_id,
            model = %self.model,
            prompt_length = prompt_length,
            "Initiating LLM call for item classification"
        );

        let prediction = match self.run_extraction::<HazmatPrediction>(&prompt).await {
            Ok(prediction) => {
                tracing::info!(
                    item_id = %item.item_id,
                    model = %self.model,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    prompt_length = prompt_length,
                    "LLM call for item classification completed successfully"
                );
                prediction
            }
            Err(e) => {
                tracing::error!(
                    item_id = %item.item_id,
                    model = %self.model,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    prompt_length = prompt_length,
                    error = %e,
                    "LLM call for item classification failed"
                );
                return Err(e);
            }
        };

        Ok(Self::apply_on_different_id(
            &item.item_id,
            prediction,
            on_different_id,
        )?)
    }

    /// Apply the configured policy to a prediction whose echoed ID may
    /// differ from the requested one.
    fn apply_on_different_id(
        requested_item_id: &str,
        mut prediction: HazmatPrediction,
        policy: OnDifferentId,
    ) -> Result<HazmatPrediction, MismatchedItemIdsError> {
        if prediction.item_id == requested_item_id {
            return Ok(prediction);
        }

        match policy {
            OnDifferentId::Raise => Err(MismatchedItemIdsError {
                input_item_id: requested_item_id.to_string(),
                prediction_item_id: prediction.item_id,
            }),
            OnDifferentId::Fix => {
                tracing::warn!(
                    input_item_id = %requested_item_id,
                    prediction_item_id = %prediction.item_id,
                    "Overwriting mismatched prediction ID with the requested one"
                );
                prediction.item_id = requested_item_id.to_string();
                Ok(prediction)
            }
            OnDifferentId::Ignore => Ok(prediction),
        }
    }

    /// Predict hazmat classification for multiple items in one prompt.
    ///
    /// Returns the predictions exactly as the model paired them; callers
    /// reconcile returned IDs against requested IDs.
    pub async fn predict_batch(
        &self,
        items: &[HazmatInputItem],
        options: PromptOptions,
    ) -> Result<Vec<HazmatPrediction>, AgentError> {
        let prompt = self.render_batch_prompt(items, options);
        let prompt_length = prompt.len();
        let start_time = std::time::Instant::now();

        tracing::debug!(
            batch_len = items.len(),
            model = %self.model,
            prompt_length = prompt_length,
            "Initiating LLM call for batch classification"
        );

        match self.run_extraction::<ExtractedPredictions>(&prompt).await {
            Ok(extracted) => {
                tracing::info!(
                    batch_len = items.len(),
                    predictions = extracted.predictions.len(),
                    model = %self.model,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    prompt_length = prompt_length,
                    "LLM call for batch classification completed successfully"
                );
                Ok(extracted.predictions)
            }
            Err(e) => {
                tracing::error!(
                    batch_len = items.len(),
                    model = %self.model,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    prompt_length = prompt_length,
                    error = %e,
                    "LLM call for batch classification failed"
                );
                Err(e)
            }
        }
    }

    /// Classify a single item and return the combined input+prediction record.
    pub async fn classify_item(
        &self,
        item: &HazmatInputItem,
        options: PromptOptions,
    ) -> Result<HazmatLabeledItem, AgentError> {
        let prediction = self
            .predict_item(item, options, OnDifferentId::Raise)
            .await?;
        Ok(HazmatLabeledItem::from_input_and_prediction(
            item, prediction,
        )?)
    }

    /// Classify multiple items and return combined records for every item
    /// the model answered; dropped items are simply absent from the result.
    pub async fn classify_batch(
        &self,
        items: &[HazmatInputItem],
        options: PromptOptions,
    ) -> Result<Vec<HazmatLabeledItem>, AgentError> {
        let predictions = self.predict_batch(items, options).await?;

        let mut by_id: HashMap<String, HazmatPrediction> = predictions
            .into_iter()
            .map(|p| (p.item_id.clone(), p))
            .collect();

        let mut labeled = Vec::new();
        for item in items {
            if let Some(prediction) = by_id.remove(&item.item_id) {
                labeled.push(HazmatLabeledItem::from_input_and_prediction(
                    item, prediction,
                )?);
            }
        }
        Ok(labeled)
    }
}
