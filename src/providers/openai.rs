use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::{error_from_response, Provider};
use crate::errors::ProviderError;

/// OpenAI client for chat completions and audio transcription
///
/// Also used for OpenAI-compatible local servers such as LM Studio.
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL, e.g. `https://api.openai.com/v1`
    endpoint: String,
    /// Model used by `test_connection`
    model: String,
}

/// Chat completion request
#[derive(Debug, Serialize, Default)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// Generated choices
    pub choices: Vec<OpenAIChoice>,

    /// Token usage information
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,
}

/// A single generated choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct OpenAIUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Audio transcription request (multipart form fields)
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    /// Transcription model, e.g. `whisper-1`
    pub model: String,
    /// Spoken language hint (ISO 639-1)
    pub language: Option<String>,
}

/// `verbose_json` transcription response
#[derive(Debug, Deserialize)]
pub struct VerboseTranscription {
    /// Detected language, reported by name (e.g. "japanese")
    #[serde(default)]
    pub language: Option<String>,
    /// Duration of the audio in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    /// Full transcript text
    #[serde(default)]
    pub text: String,
    /// Timed segments; omitted by some compatible servers
    #[serde(default)]
    pub segments: Option<Vec<TranscriptionSegment>>,
}

/// One timed segment of a `verbose_json` transcription
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl OpenAIRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of generated tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_timeout(api_key, endpoint, model, Duration::from_secs(120))
    }

    /// Create a new OpenAI client with a request timeout
    pub fn with_timeout(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        let base = if self.endpoint.is_empty() {
            "https://api.openai.com/v1"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/{}", base, path)
    }

    /// Upload an audio file and return its timed transcription
    pub async fn transcribe(
        &self,
        audio_path: &Path,
        request: &TranscriptionRequest,
    ) -> Result<VerboseTranscription, ProviderError> {
        let bytes = tokio::fs::read(audio_path)
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read audio file {:?}: {}", audio_path, e)))?;

        let file_name = audio_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.mp3".to_string());
        debug!("Uploading {} ({} bytes) for transcription", file_name, bytes.len());

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", request.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment");
        if let Some(language) = &request.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .client
            .post(self.url("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = error_from_response(response).await;
            error!("OpenAI transcription error: {}", error);
            return Err(error);
        }

        response
            .json::<VerboseTranscription>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse transcription response: {}", e)))
    }
}

#[async_trait]
impl Provider for OpenAI {
    type Request = OpenAIRequest;
    type Response = OpenAIResponse;

    async fn complete(&self, request: OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = error_from_response(response).await;
            error!("OpenAI API error: {}", error);
            return Err(error);
        }

        response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse OpenAI API response: {}", e)))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = OpenAIRequest::new(self.model.clone())
            .add_message("user", "Hello")
            .max_tokens(5);
        self.complete(request).await.map(|_| ())
    }

    fn extract_text(response: &OpenAIResponse) -> String {
        response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}
