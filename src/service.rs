/*!
 * Language model service.
 *
 * `LanguageService` wraps one of the provider clients behind the
 * `ChatCompletion` trait used by the merger, the enrichment pipeline and
 * the analyzer. It adds a per-call timeout and retries transient failures
 * with exponential backoff.
 */

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use url::Url;

use crate::app_config::{AssistantConfig, AssistantProvider};
use crate::errors::ProviderError;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::ollama::{ChatRequest, Ollama};
use crate::providers::openai::{OpenAI, OpenAIRequest};
use crate::providers::Provider;

/// Upper bound on generated tokens for a single call
const MAX_COMPLETION_TOKENS: u32 = 4096;

/// A system + user prompt in, plain text out
///
/// Every language collaborator of the pipeline is reached through this trait,
/// so tests can substitute a scripted implementation.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Run one completion and return the raw response text
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError>;
}

#[async_trait]
impl<T: ChatCompletion + ?Sized> ChatCompletion for std::sync::Arc<T> {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        (**self).complete(system, user).await
    }
}

/// Retry schedule for collaborator calls
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retry_count: u32,
    /// Base delay, doubled on every retry
    pub backoff_ms: u64,
}

impl RetryPolicy {
    pub fn new(retry_count: u32, backoff_ms: u64) -> Self {
        Self { retry_count, backoff_ms }
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(1u64 << attempt.min(16)))
    }

    /// Run `operation` until it succeeds, fails permanently or runs out of retries
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retry_count => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "{} failed: {} - attempt {}/{}, retrying in {}ms",
                        label,
                        e,
                        attempt + 1,
                        self.retry_count + 1,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Provider client variants
#[derive(Debug)]
enum LanguageProviderImpl {
    /// OpenAI API service
    OpenAI { client: OpenAI },
    /// LM Studio local server (OpenAI-compatible)
    LMStudio { client: OpenAI },
    /// Anthropic API service
    Anthropic { client: Anthropic },
    /// Ollama local server
    Ollama { client: Ollama },
}

/// Chat completion service over the configured provider
#[derive(Debug)]
pub struct LanguageService {
    provider: LanguageProviderImpl,
    provider_kind: AssistantProvider,
    model: String,
    temperature: f32,
    timeout: Duration,
    retry: RetryPolicy,
}

/// Normalize an endpoint into a base URL, adding `http://` when no scheme is given
pub fn normalize_endpoint(endpoint: &str) -> Result<String> {
    if endpoint.trim().is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    if url.host_str().is_none() {
        return Err(anyhow!("Invalid host in endpoint: {}", endpoint));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

impl LanguageService {
    /// Create a service for the active provider of the assistant configuration
    pub fn new(config: &AssistantConfig) -> Result<Self> {
        let provider_kind = config.provider;
        let model = config.get_model();
        let timeout_secs = config.get_timeout_secs();
        let timeout = Duration::from_secs(timeout_secs);
        let endpoint = normalize_endpoint(&config.get_endpoint())?;

        let provider = match provider_kind {
            AssistantProvider::OpenAI => LanguageProviderImpl::OpenAI {
                client: OpenAI::with_timeout(config.get_api_key(), endpoint, model.clone(), timeout),
            },
            AssistantProvider::LMStudio => {
                // LM Studio usually runs without a key
                let api_key = {
                    let k = config.get_api_key();
                    if k.is_empty() { "lm-studio".to_string() } else { k }
                };
                LanguageProviderImpl::LMStudio {
                    client: OpenAI::with_timeout(api_key, endpoint, model.clone(), timeout),
                }
            }
            AssistantProvider::Anthropic => LanguageProviderImpl::Anthropic {
                client: Anthropic::new(config.get_api_key(), endpoint, model.clone(), timeout),
            },
            AssistantProvider::Ollama => LanguageProviderImpl::Ollama {
                client: Ollama::new(endpoint, timeout),
            },
        };

        debug!(
            "Language service: {} model {} (timeout {}s, {} retries)",
            provider_kind.display_name(),
            model,
            timeout_secs,
            config.common.retry_count
        );

        Ok(Self {
            provider,
            provider_kind,
            model,
            temperature: config.common.temperature,
            timeout,
            retry: RetryPolicy::new(config.common.retry_count, config.common.retry_backoff_ms),
        })
    }

    /// Name of the provider in use
    pub fn provider_name(&self) -> &str {
        self.provider_kind.display_name()
    }

    /// Model in use
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Test the connection to the provider
    pub async fn test_connection(&self) -> Result<()> {
        let result = match &self.provider {
            LanguageProviderImpl::OpenAI { client } | LanguageProviderImpl::LMStudio { client } => {
                client.test_connection().await
            }
            LanguageProviderImpl::Anthropic { client } => client.test_connection().await,
            LanguageProviderImpl::Ollama { client } => client.test_connection().await,
        };
        result.map_err(|e| anyhow!("Failed to connect to {}: {}", self.provider_name(), e))
    }

    async fn complete_once(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let call = async {
            match &self.provider {
                LanguageProviderImpl::OpenAI { client } | LanguageProviderImpl::LMStudio { client } => {
                    let request = OpenAIRequest::new(self.model.clone())
                        .add_message("system", system)
                        .add_message("user", user)
                        .temperature(self.temperature);
                    client.complete(request).await.map(|r| OpenAI::extract_text(&r))
                }
                LanguageProviderImpl::Anthropic { client } => {
                    let request = AnthropicRequest::new(self.model.clone(), MAX_COMPLETION_TOKENS)
                        .system(system)
                        .add_message("user", user)
                        .temperature(self.temperature);
                    client.complete(request).await.map(|r| Anthropic::extract_text(&r))
                }
                LanguageProviderImpl::Ollama { client } => {
                    let request = ChatRequest::new(self.model.clone())
                        .add_message("system", system)
                        .add_message("user", user)
                        .temperature(self.temperature);
                    client.complete(request).await.map(|r| Ollama::extract_text(&r))
                }
            }
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout.as_secs())),
        }
    }
}

#[async_trait]
impl ChatCompletion for LanguageService {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let label = format!("{} request", self.provider_name());
        self.retry.run(&label, || self.complete_once(system, user)).await
    }
}
