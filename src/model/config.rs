//! Application configuration

use serde::Deserialize;
use std::fs;
use std::path::Path;

const ENV_CONFIG_PATH: &str = "HAZMATE_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "hazmate.yaml";

const ENV_MODEL: &str = "HAZMATE_MODEL";
/// Default classification model (can be overridden per run).
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 16384;
pub const DEFAULT_PARALLEL_BATCHES: usize = 1;

/// Batch processing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of items per classification batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Token budget for a single batch prompt. Pass a smaller value than the
    /// provider's official limit to avoid hitting the context window.
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,
    /// Number of concurrently in-flight batches.
    #[serde(default = "default_parallel_batches")]
    pub parallel_batches: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_input_tokens() -> usize {
    DEFAULT_MAX_INPUT_TOKENS
}

fn default_parallel_batches() -> usize {
    DEFAULT_PARALLEL_BATCHES
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_input_tokens: DEFAULT_MAX_INPUT_TOKENS,
            parallel_batches: DEFAULT_PARALLEL_BATCHES,
        }
    }
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub batch: Option<BatchConfig>,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub model: String,
    pub batch: BatchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            batch: BatchConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file.
    ///
    /// Precedence: `HAZMATE_MODEL` env var, then the YAML config file, then
    /// built-in defaults. CLI flags are applied on top by the caller.
    pub fn from_env() -> Self {
        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let config_file = Self::load_config_file(&config_path).unwrap_or_default();

        let model = std::env::var(ENV_MODEL)
            .ok()
            .or(config_file.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Self {
            model,
            batch: config_file.batch.unwrap_or_default(),
        }
    }

    /// Read the YAML config file, if there is one.
    ///
    /// A missing, empty, or unreadable file is not an error; the run falls
    /// back to built-in defaults so the binary works out of the box.
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, falling back to defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                let contents = contents.trim();
                if contents.is_empty() {
                    tracing::debug!(path = %path.display(), "Config file is empty, falling back to defaults");
                    return Some(ConfigFile::default());
                }

                match serde_yaml::from_str(contents) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "Applied configuration file");
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Config file did not parse, falling back to defaults");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Config file could not be read, falling back to defaults");
                None
            }
        }
    }
}
