/*!
 * Provider implementations for the language model services.
 *
 * This module contains client implementations for the supported LLM providers:
 * - OpenAI: OpenAI API integration (also used for LM Studio and for transcription)
 * - Anthropic: Anthropic API integration
 * - Ollama: Local LLM server
 * - Mock: scripted provider for tests and offline runs
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the language service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Read an unsuccessful HTTP response into a provider error
pub(crate) async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());
    ProviderError::from_status(status, body)
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;
