use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::language_utils::DisplayLanguage;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Spoken language of the processed media (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Language translations and analyses are written in
    #[serde(default)]
    pub display_language: DisplayLanguage,

    /// Speech-to-text settings
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Chat model settings used by the merge, translate, annotate and analyze calls
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Segmentation and output settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Chat model provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssistantProvider {
    #[default]
    OpenAI,
    Anthropic,
    Ollama,
    // LM Studio exposes an OpenAI-compatible server
    LMStudio,
}

impl AssistantProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Ollama => "Ollama",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Ollama => "ollama".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    /// Whether requests must carry an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI | Self::Anthropic)
    }

    /// Environment variable consulted when the config has no API key
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Ollama | Self::LMStudio => None,
        }
    }
}

impl std::fmt::Display for AssistantProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for AssistantProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Max concurrent sentences being enriched
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    // @field: Timeout seconds per request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: AssistantProvider) -> Self {
        let (model, endpoint, concurrent_requests) = match provider_type {
            AssistantProvider::OpenAI => (default_openai_model(), default_openai_endpoint(), default_concurrent_requests()),
            AssistantProvider::Anthropic => (default_anthropic_model(), default_anthropic_endpoint(), 3),
            AssistantProvider::Ollama => (default_ollama_model(), default_ollama_endpoint(), 2),
            AssistantProvider::LMStudio => (default_lmstudio_model(), default_lmstudio_endpoint(), 2),
        };

        Self {
            provider_type: provider_type.to_lowercase_string(),
            model,
            api_key: String::new(),
            endpoint,
            concurrent_requests,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Chat model service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssistantConfig {
    /// Provider to use
    #[serde(default)]
    pub provider: AssistantProvider,

    /// Available providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Settings shared by all providers
    #[serde(default)]
    pub common: AssistantCommonConfig,
}

/// Settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssistantCommonConfig {
    /// Retry count for transient failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for AssistantCommonConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
        }
    }
}

/// Speech-to-text configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranscriptionConfig {
    /// Transcription model name
    #[serde(default = "default_transcription_model")]
    pub model: String,

    /// OpenAI-compatible endpoint base URL
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    /// API key, falls back to OPENAI_API_KEY
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Upload and transcription can take a while for long clips
    #[serde(default = "default_transcription_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: default_transcription_model(),
            endpoint: default_openai_endpoint(),
            api_key: String::new(),
            timeout_secs: default_transcription_timeout_secs(),
        }
    }
}

impl TranscriptionConfig {
    /// API key from the config, or from the environment
    pub fn resolve_api_key(&self) -> String {
        if !self.api_key.is_empty() {
            return self.api_key.clone();
        }
        std::env::var("OPENAI_API_KEY").unwrap_or_default()
    }
}

/// How merged sentences are mapped back onto segment timestamps
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimestampStrategy {
    /// Index arithmetic over the original segment list
    #[default]
    Positional,
    /// Match merged text against the segment texts it was built from
    ContentAware,
}

/// Segmentation and output settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Timestamp reconciliation strategy
    #[serde(default)]
    pub timestamp_strategy: TimestampStrategy,

    /// A first merged line less similar than this to the first segment is dropped
    #[serde(default = "default_preamble_similarity_threshold")]
    pub preamble_similarity_threshold: f64,

    /// Also write an SRT copy of the subtitle track
    #[serde(default)]
    pub write_srt: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timestamp_strategy: TimestampStrategy::default(),
            preamble_similarity_threshold: default_preamble_similarity_threshold(),
            write_srt: false,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "ja".to_string()
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_transcription_timeout_secs() -> u64 {
    300
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_preamble_similarity_threshold() -> f64 {
    0.2
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_lmstudio_endpoint() -> String {
    "http://localhost:1234/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_ollama_model() -> String {
    "qwen2.5:7b".to_string()
}

fn default_lmstudio_model() -> String {
    // Placeholder; users should set the model loaded in LM Studio
    "local-model".to_string()
}

impl Config {
    /// Load a config file, or create one with defaults when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<(Self, bool)> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok((config, false));
        }

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok((config, true))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;

        if self.assistant.provider.requires_api_key() && self.assistant.get_api_key().is_empty() {
            return Err(anyhow!(
                "API key is required for {} provider",
                self.assistant.provider.display_name()
            ));
        }

        if self.assistant.common.retry_count < 1 {
            return Err(anyhow!("retry_count must be at least 1"));
        }

        if self.assistant.get_concurrent_requests() < 1 {
            return Err(anyhow!("concurrent_requests must be at least 1"));
        }

        let threshold = self.pipeline.preamble_similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(anyhow!(
                "preamble_similarity_threshold must be within [0, 1], got {}",
                threshold
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            display_language: DisplayLanguage::default(),
            transcription: TranscriptionConfig::default(),
            assistant: AssistantConfig::default(),
            pipeline: PipelineConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl AssistantConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &AssistantProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter().find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, inserting defaults if absent
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let position = match self.available_providers.iter().position(|p| p.provider_type == provider_str) {
            Some(position) => position,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[position]
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.model.is_empty() => provider_config.model.clone(),
            _ => ProviderConfig::new(self.provider).model,
        }
    }

    /// Get the API key for the active provider, falling back to the environment
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }

        self.provider
            .api_key_env_var()
            .and_then(|var| std::env::var(var).ok())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.endpoint.is_empty() => provider_config.endpoint.clone(),
            _ => ProviderConfig::new(self.provider).endpoint,
        }
    }

    /// Get the number of sentences enriched concurrently
    pub fn get_concurrent_requests(&self) -> usize {
        self.get_active_provider_config()
            .map(|p| p.concurrent_requests)
            .unwrap_or_else(default_concurrent_requests)
    }

    /// Get the per-request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|t| *t > 0)
            .unwrap_or_else(default_timeout_secs)
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            provider: AssistantProvider::default(),
            available_providers: vec![
                ProviderConfig::new(AssistantProvider::OpenAI),
                ProviderConfig::new(AssistantProvider::Anthropic),
                ProviderConfig::new(AssistantProvider::Ollama),
                ProviderConfig::new(AssistantProvider::LMStudio),
            ],
            common: AssistantCommonConfig::default(),
        }
    }
}
