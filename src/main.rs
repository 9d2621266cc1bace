//! hazmate: hazmat classification for marketplace listings
//!
//! Reads a JSONL dataset of product listings, classifies each one as
//! hazardous-material or not with an LLM, and writes labeled records to a
//! resumable JSONL output file.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod agent;
mod model;
mod pipeline;
mod store;
mod util;

use agent::{HazmatAgent, LlmClient};
use model::{Config, HazmatInputItem, PromptOptions};
use pipeline::{
    BatchDriver, DriverConfig, MismatchPolicy, OnExistingOutput, OutputSink, WorkPool,
};
use store::{ExampleStore, JsonlExampleStore};

#[derive(Debug, Parser)]
#[command(name = "hazmate", about = "Classify marketplace listings as hazmat")]
struct Cli {
    /// Input dataset, one product listing JSON object per line.
    #[arg(long, default_value = "data/input_dataset.jsonl")]
    input: PathBuf,

    /// Output file for labeled items, one JSON object per line.
    #[arg(long, default_value = "data/output_dataset.jsonl")]
    output: PathBuf,

    /// What to do when the output file already exists.
    #[arg(long, value_enum, default_value_t = OutputMode::Raise)]
    on_existing_output: OutputMode,

    /// Model to classify with (overrides config file and environment).
    #[arg(long)]
    model_name: Option<String>,

    /// Maximum number of items per classification batch.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Token budget for a single batch prompt.
    #[arg(long)]
    max_input_tokens: Option<usize>,

    /// Number of concurrently in-flight batches.
    #[arg(long)]
    parallel_batches: Option<usize>,

    /// How to treat a batch response missing some of the requested items.
    #[arg(long, value_enum, default_value_t = MismatchMode::Lenient)]
    on_mismatch: MismatchMode,

    /// Labeled JSONL file of ground-truth examples to inject into prompts.
    #[arg(long)]
    examples: Option<PathBuf>,

    /// Leave item IDs out of the rendered prompts.
    #[arg(long)]
    exclude_item_ids: bool,

    /// Leave structured attributes out of the rendered prompts.
    #[arg(long)]
    exclude_attributes: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputMode {
    /// Skip already-written items and append to the existing file.
    Continue,
    /// Truncate the existing file and start over.
    Overwrite,
    /// Refuse to touch an existing file.
    Raise,
}

impl From<OutputMode> for OnExistingOutput {
    fn from(mode: OutputMode) -> Self {
        match mode {
            OutputMode::Continue => OnExistingOutput::Continue,
            OutputMode::Overwrite => OnExistingOutput::Overwrite,
            OutputMode::Raise => OnExistingOutput::Raise,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MismatchMode {
    /// Abort the run on any dropped item.
    Strict,
    /// Re-queue dropped items and keep going.
    Lenient,
}

impl From<MismatchMode> for MismatchPolicy {
    fn from(mode: MismatchMode) -> Self {
        match mode {
            MismatchMode::Strict => MismatchPolicy::Strict,
            MismatchMode::Lenient => MismatchPolicy::Lenient,
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load the input dataset, one item per line.
fn load_input_items(path: &std::path::Path) -> Result<Vec<HazmatInputItem>, std::io::Error> {
    let contents = std::fs::read_to_string(path)?;

    let mut items = Vec::new();
    for (line_number, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let item: HazmatInputItem = serde_json::from_str(line).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "invalid input item at {}:{}: {e}",
                    path.display(),
                    line_number + 1
                ),
            )
        })?;
        items.push(item);
    }
    Ok(items)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env();

    let model = cli.model_name.unwrap_or(config.model);
    let driver_config = DriverConfig {
        batch_size: cli.batch_size.unwrap_or(config.batch.batch_size),
        max_input_tokens: cli.max_input_tokens.unwrap_or(config.batch.max_input_tokens),
        parallel_batches: cli.parallel_batches.unwrap_or(config.batch.parallel_batches),
        prompt_options: PromptOptions {
            include_item_id: !cli.exclude_item_ids,
            include_attributes: !cli.exclude_attributes,
        },
        mismatch_policy: cli.on_mismatch.into(),
    };

    let items = load_input_items(&cli.input)?;
    tracing::info!(
        input = %cli.input.display(),
        item_count = items.len(),
        model = %model,
        batch_size = driver_config.batch_size,
        max_input_tokens = driver_config.max_input_tokens,
        parallel_batches = driver_config.parallel_batches,
        "Starting classification run"
    );

    let example_store: Option<Arc<dyn ExampleStore>> = match &cli.examples {
        Some(path) => Some(Arc::new(JsonlExampleStore::from_path(path)?)),
        None => None,
    };

    let llm_client = LlmClient::from_env()?;
    let agent = HazmatAgent::new(llm_client, model, example_store);

    let mut sink = OutputSink::open(&cli.output, cli.on_existing_output.into())?;
    let mut pool = WorkPool::new(items);
    pool.retain_unprocessed(sink.already_written());

    let driver = BatchDriver::new(&agent, driver_config);
    let report = driver.run(pool, &mut sink).await?;

    tracing::info!(
        output = %cli.output.display(),
        processed = report.processed,
        requeued_total = report.requeued,
        permanently_failed = report.failed.len(),
        "Classification run finished"
    );
    for failure in &report.failed {
        tracing::error!(
            item_id = %failure.item.item_id,
            estimated_tokens = failure.estimated_tokens,
            max_tokens = failure.max_tokens,
            "Item was too large for the token budget and was not classified"
        );
    }

    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(format!("{} item(s) exceeded the token budget", report.failed.len()).into())
    }
}
