//! Batch classification driver loop
//!
//! Pulls token-budgeted batches from the pool, keeps up to
//! `parallel_batches` classification calls in flight, and reconciles each
//! completion as it arrives. Resolved items are written immediately so
//! partial progress survives a crash; dropped or failed items go back into
//! the pool until it drains.

use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;

use crate::model::PromptOptions;
use crate::pipeline::batching::{extract_batch, BatchTooLargeError};
use crate::pipeline::invoker::{dispatch_batch, BatchOutcome, ClassificationInvoker};
use crate::pipeline::pool::WorkPool;
use crate::pipeline::reconcile::{reconcile, MismatchPolicy, MismatchedPredictionsError};
use crate::pipeline::sink::{OutputSink, SinkError};

/// Driver configuration, resolved from config file and CLI flags.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub batch_size: usize,
    pub max_input_tokens: usize,
    pub parallel_batches: usize,
    pub prompt_options: PromptOptions,
    pub mismatch_policy: MismatchPolicy,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            batch_size: crate::model::config::DEFAULT_BATCH_SIZE,
            max_input_tokens: crate::model::config::DEFAULT_MAX_INPUT_TOKENS,
            parallel_batches: crate::model::config::DEFAULT_PARALLEL_BATCHES,
            prompt_options: PromptOptions::default(),
            mismatch_policy: MismatchPolicy::Lenient,
        }
    }
}

/// Error that aborts a run.
///
/// Invoker failures never abort (they re-queue); only systemic correctness
/// problems and I/O failures do.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Mismatch(#[from] MismatchedPredictionsError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Summary of a completed run.
///
/// Conservation: for a fresh run, `processed + failed.len()` equals the
/// initial pool size; no item is silently lost.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Items successfully classified and written.
    pub processed: usize,
    /// Total re-queue events (failed batches plus dropped items).
    pub requeued: usize,
    /// Items that can never fit the token budget on their own.
    pub failed: Vec<BatchTooLargeError>,
}

/// The top-level control loop over a work pool.
pub struct BatchDriver<'a, I: ClassificationInvoker + ?Sized> {
    invoker: &'a I,
    config: DriverConfig,
}

impl<'a, I: ClassificationInvoker + ?Sized> BatchDriver<'a, I> {
    pub fn new(invoker: &'a I, config: DriverConfig) -> Self {
        Self { invoker, config }
    }

    /// Drive the pool to empty, writing resolved items to the sink.
    pub async fn run(
        &self,
        mut pool: WorkPool,
        sink: &mut OutputSink,
    ) -> Result<RunReport, DriverError> {
        let mut report = RunReport::default();
        let mut in_flight = FuturesUnordered::new();
        let options = self.config.prompt_options;
        let parallel_batches = self.config.parallel_batches.max(1);

        loop {
            // Saturate the in-flight slots from the pool.
            while !pool.is_empty() && in_flight.len() < parallel_batches {
                let extracted = extract_batch(
                    &mut pool,
                    self.config.batch_size,
                    self.config.max_input_tokens,
                    |items| self.invoker.render_batch_prompt(items, options),
                );
                match extracted {
                    Ok(batch) if batch.is_empty() => break,
                    Ok(batch) => {
                        tracing::info!(
                            batch_len = batch.len(),
                            items_remaining = pool.len(),
                            in_flight = in_flight.len() + 1,
                            "Dispatching batch"
                        );
                        in_flight.push(dispatch_batch(self.invoker, batch, options));
                    }
                    Err(e) => {
                        tracing::error!(
                            item_id = %e.item.item_id,
                            estimated_tokens = e.estimated_tokens,
                            max_tokens = e.max_tokens,
                            "Item cannot fit the token budget, recording as failed"
                        );
                        report.failed.push(e);
                    }
                }
            }

            // Suspend until any one in-flight batch completes.
            let Some((batch, outcome)) = in_flight.next().await else {
                break;
            };

            match outcome {
                BatchOutcome::Failed => {
                    report.requeued += batch.len();
                    pool.extend(batch);
                }
                BatchOutcome::Predictions(predictions) => {
                    let reconciliation =
                        reconcile(batch, predictions, self.config.mismatch_policy)?;

                    for labeled in &reconciliation.resolved {
                        sink.write(labeled)?;
                    }
                    report.processed += reconciliation.resolved.len();

                    if !reconciliation.to_requeue.is_empty() {
                        tracing::warn!(
                            requeued = reconciliation.to_requeue.len(),
                            "Re-queueing items missing from the batch response"
                        );
                        report.requeued += reconciliation.to_requeue.len();
                        pool.extend(reconciliation.to_requeue);
                    }
                }
            }

            tracing::info!(
                items_remaining = pool.len(),
                processed = report.processed,
                requeued_total = report.requeued,
                "Batch reconciled"
            );
        }

        tracing::info!(
            processed = report.processed,
            requeued_total = report.requeued,
            permanently_failed = report.failed.len(),
            "Run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentError;
    use crate::model::{HazmatInputItem, HazmatPrediction};
    use crate::pipeline::sink::OnExistingOutput;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn item(id: &str, description_len: usize) -> HazmatInputItem {
        HazmatInputItem {
            item_id: id.to_string(),
            name: format!("Product {id}"),
            domain_id: "MLB-TOOLS".to_string(),
            family_name: "Family".to_string(),
            permalink: None,
            description: Some("d".repeat(description_len)),
            short_description: None,
            keywords: None,
            attributes: Vec::new(),
            main_features: Vec::new(),
        }
    }

    fn items(count: usize) -> Vec<HazmatInputItem> {
        (0..count).map(|i| item(&format!("MLB{i}"), 20)).collect()
    }

    /// Scripted stand-in for the real agent.
    struct ScriptedInvoker {
        /// Number of leading calls that fail outright.
        fail_first: Mutex<usize>,
        /// IDs silently dropped from the first response they appear in.
        drop_once: Mutex<HashSet<String>>,
        calls: Mutex<usize>,
    }

    impl ScriptedInvoker {
        fn reliable() -> Self {
            Self {
                fail_first: Mutex::new(0),
                drop_once: Mutex::new(HashSet::new()),
                calls: Mutex::new(0),
            }
        }

        fn failing_first(n: usize) -> Self {
            let invoker = Self::reliable();
            *invoker.fail_first.lock().unwrap() = n;
            invoker
        }

        fn dropping_once(ids: &[&str]) -> Self {
            let invoker = Self::reliable();
            *invoker.drop_once.lock().unwrap() = ids.iter().map(|s| s.to_string()).collect();
            invoker
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ClassificationInvoker for ScriptedInvoker {
        fn render_batch_prompt(
            &self,
            items: &[HazmatInputItem],
            _options: PromptOptions,
        ) -> String {
            items
                .iter()
                .map(|i| i.description.clone().unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\n")
        }

        async fn classify_batch(
            &self,
            items: &[HazmatInputItem],
            _options: PromptOptions,
        ) -> Result<Vec<HazmatPrediction>, AgentError> {
            *self.calls.lock().unwrap() += 1;

            {
                let mut fail_first = self.fail_first.lock().unwrap();
                if *fail_first > 0 {
                    *fail_first -= 1;
                    return Err(AgentError::PredictionFailed("simulated outage".to_string()));
                }
            }

            let mut drop_once = self.drop_once.lock().unwrap();
            Ok(items
                .iter()
                .filter(|i| !drop_once.remove(&i.item_id))
                .map(|i| HazmatPrediction {
                    item_id: i.item_id.clone(),
                    is_hazmat: false,
                    traits: Vec::new(),
                    reason: "scripted".to_string(),
                })
                .collect())
        }
    }

    fn sink_in(dir: &tempfile::TempDir) -> OutputSink {
        OutputSink::open(&dir.path().join("out.jsonl"), OnExistingOutput::Raise).unwrap()
    }

    fn written_ids(dir: &tempfile::TempDir) -> Vec<String> {
        let contents = std::fs::read_to_string(dir.path().join("out.jsonl")).unwrap();
        contents
            .lines()
            .map(|line| {
                serde_json::from_str::<crate::model::HazmatLabeledItem>(line)
                    .unwrap()
                    .item_id
            })
            .collect()
    }

    #[tokio::test]
    async fn test_every_item_is_written_exactly_once() {
        let invoker = ScriptedInvoker::reliable();
        let driver = BatchDriver::new(&invoker, DriverConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(&dir);

        let report = driver.run(WorkPool::new(items(25)), &mut sink).await.unwrap();

        assert_eq!(report.processed, 25);
        assert!(report.failed.is_empty());
        let ids = written_ids(&dir);
        assert_eq!(ids.len(), 25);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 25);
        assert_eq!(invoker.calls(), 3); // ceil(25 / 10)
    }

    #[tokio::test]
    async fn test_failed_batch_is_retried_without_duplicates() {
        let invoker = ScriptedInvoker::failing_first(1);
        let driver = BatchDriver::new(&invoker, DriverConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(&dir);

        let report = driver.run(WorkPool::new(items(5)), &mut sink).await.unwrap();

        assert_eq!(report.processed, 5);
        assert_eq!(report.requeued, 5);
        let ids = written_ids(&dir);
        assert_eq!(ids.len(), 5);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 5);
        assert_eq!(invoker.calls(), 2);
    }

    #[tokio::test]
    async fn test_dropped_items_are_requeued_and_recovered() {
        let invoker = ScriptedInvoker::dropping_once(&["MLB1"]);
        let driver = BatchDriver::new(&invoker, DriverConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(&dir);

        let report = driver.run(WorkPool::new(items(3)), &mut sink).await.unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(report.requeued, 1);
        let ids = written_ids(&dir);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 3);
    }

    #[tokio::test]
    async fn test_strict_policy_aborts_on_dropped_item() {
        let invoker = ScriptedInvoker::dropping_once(&["MLB0"]);
        let config = DriverConfig {
            mismatch_policy: MismatchPolicy::Strict,
            ..DriverConfig::default()
        };
        let driver = BatchDriver::new(&invoker, config);
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(&dir);

        let err = driver
            .run(WorkPool::new(items(2)), &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Mismatch(_)));
    }

    #[tokio::test]
    async fn test_oversized_item_fails_without_stalling_the_run() {
        let invoker = ScriptedInvoker::reliable();
        let config = DriverConfig {
            // 50-token budget: a 20-char description fits, a 1000-char one
            // can never fit.
            max_input_tokens: 50,
            batch_size: 2,
            ..DriverConfig::default()
        };
        let driver = BatchDriver::new(&invoker, config);
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(&dir);

        let mut pool_items = items(4);
        pool_items.push(item("MLB-FAT", 1000));
        let report = driver
            .run(WorkPool::new(pool_items), &mut sink)
            .await
            .unwrap();

        assert_eq!(report.processed, 4);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].item.item_id, "MLB-FAT");
        // Conservation: nothing silently lost.
        assert_eq!(report.processed + report.failed.len(), 5);
    }

    #[tokio::test]
    async fn test_concurrent_batches_process_everything() {
        let invoker = ScriptedInvoker::reliable();
        let config = DriverConfig {
            batch_size: 3,
            parallel_batches: 4,
            ..DriverConfig::default()
        };
        let driver = BatchDriver::new(&invoker, config);
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(&dir);

        let report = driver.run(WorkPool::new(items(20)), &mut sink).await.unwrap();

        assert_eq!(report.processed, 20);
        let ids = written_ids(&dir);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 20);
    }

    #[tokio::test]
    async fn test_resumed_run_writes_nothing_new() {
        let invoker = ScriptedInvoker::reliable();
        let driver = BatchDriver::new(&invoker, DriverConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let mut sink = OutputSink::open(&path, OnExistingOutput::Raise).unwrap();
        let report = driver.run(WorkPool::new(items(8)), &mut sink).await.unwrap();
        assert_eq!(report.processed, 8);
        drop(sink);

        // Second run over the same input resumes and finds nothing to do.
        let mut sink = OutputSink::open(&path, OnExistingOutput::Continue).unwrap();
        let mut pool = WorkPool::new(items(8));
        pool.retain_unprocessed(sink.already_written());
        let report = driver.run(pool, &mut sink).await.unwrap();

        assert_eq!(report.processed, 0);
        assert_eq!(sink.written(), 0);
        drop(sink);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 8);
    }

    #[tokio::test]
    async fn test_empty_pool_completes_immediately() {
        let invoker = ScriptedInvoker::reliable();
        let driver = BatchDriver::new(&invoker, DriverConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let mut sink = sink_in(&dir);

        let report = driver.run(WorkPool::default(), &mut sink).await.unwrap();
        assert_eq!(report.processed, 0);
        assert_eq!(invoker.calls(), 0);
    }
}
