//! OpenAI client handle shared across classification calls

use rig::providers::openai;

use crate::agent::error::AgentError;

const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Thin wrapper around the OpenAI provider client.
///
/// Cheap to clone; one instance is shared by every extractor the agent
/// builds.
#[derive(Clone)]
pub struct LlmClient {
    client: openai::Client,
}

impl LlmClient {
    pub fn new(api_key: &str) -> Result<Self, AgentError> {
        let client = openai::Client::builder(api_key)
            .build()
            .map_err(|e| AgentError::ClientInit(format!("OpenAI client setup failed: {e}")))?;

        Ok(Self { client })
    }

    /// Build a client from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, AgentError> {
        let api_key = std::env::var(ENV_OPENAI_API_KEY)
            .map_err(|_| AgentError::ClientInit(format!("{ENV_OPENAI_API_KEY} is not set")))?;
        Self::new(&api_key)
    }

    /// The underlying provider client, for building extractors.
    pub fn openai_client(&self) -> &openai::Client {
        &self.client
    }
}
