//! Classification dispatch with failure capture

use async_trait::async_trait;

use crate::agent::{AgentError, HazmatAgent};
use crate::model::{HazmatInputItem, HazmatPrediction, PromptOptions};

/// Seam between the batch driver and the model-run capability.
#[async_trait]
pub trait ClassificationInvoker: Send + Sync {
    /// Render the prompt a batch would be sent with, for token budgeting.
    fn render_batch_prompt(&self, items: &[HazmatInputItem], options: PromptOptions) -> String;

    /// Classify a batch of items in one model call.
    async fn classify_batch(
        &self,
        items: &[HazmatInputItem],
        options: PromptOptions,
    ) -> Result<Vec<HazmatPrediction>, AgentError>;
}

#[async_trait]
impl ClassificationInvoker for HazmatAgent {
    fn render_batch_prompt(&self, items: &[HazmatInputItem], options: PromptOptions) -> String {
        HazmatAgent::render_batch_prompt(self, items, options)
    }

    async fn classify_batch(
        &self,
        items: &[HazmatInputItem],
        options: PromptOptions,
    ) -> Result<Vec<HazmatPrediction>, AgentError> {
        self.predict_batch(items, options).await
    }
}

/// Outcome of one batch attempt.
///
/// Failures are data, not exceptions: the batch always comes back alongside
/// the outcome so the driver can re-queue it.
#[derive(Debug)]
pub enum BatchOutcome {
    Predictions(Vec<HazmatPrediction>),
    Failed,
}

/// Run one batch attempt, converting any model-run error into
/// [`BatchOutcome::Failed`] so a single bad batch never aborts the run.
pub async fn dispatch_batch<I>(
    invoker: &I,
    batch: Vec<HazmatInputItem>,
    options: PromptOptions,
) -> (Vec<HazmatInputItem>, BatchOutcome)
where
    I: ClassificationInvoker + ?Sized,
{
    match invoker.classify_batch(&batch, options).await {
        Ok(predictions) => (batch, BatchOutcome::Predictions(predictions)),
        Err(e) => {
            tracing::error!(
                batch_len = batch.len(),
                error = %e,
                "Batch classification failed, items will be re-queued"
            );
            (batch, BatchOutcome::Failed)
        }
    }
}
