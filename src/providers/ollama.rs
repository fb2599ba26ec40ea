use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{error_from_response, Provider};
use crate::errors::ProviderError;

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
}

/// Chat message object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Model name to use for generation
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
}

/// Chat response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Model name
    pub model: String,
    /// Response message
    pub message: ChatMessage,
    /// Whether the generation is complete
    pub done: bool,
    /// Number of prompt tokens
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(default)]
    pub eval_count: Option<u64>,
}

/// Version response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

impl ChatRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            options: None,
            stream: false,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }
}

impl Ollama {
    /// Create a new Ollama client from a base URL such as `http://localhost:11434`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(timeout)
                // Ollama uses HTTP/1.1
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Get the version of the Ollama server
    pub async fn version(&self) -> Result<VersionResponse, ProviderError> {
        let response = self
            .client
            .get(format!("{}/api/version", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        response
            .json::<VersionResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl Provider for Ollama {
    type Request = ChatRequest;
    type Response = ChatResponse;

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = error_from_response(response).await;
            error!("Ollama API error: {}", error);
            return Err(error);
        }

        let text = response.text().await?;
        serde_json::from_str::<ChatResponse>(&text).map_err(|e| {
            let preview: String = text.chars().take(500).collect();
            error!("Failed to parse Ollama API response: {}. Raw response (first 500 chars): {}", e, preview);
            ProviderError::ParseError(e.to_string())
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.version().await.map(|_| ())
    }

    fn extract_text(response: &ChatResponse) -> String {
        response.message.content.clone()
    }
}
