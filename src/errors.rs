/*!
 * Error types for the yomikaki application.
 *
 * This module contains custom error types for the different parts of the
 * application, using the thiserror crate for ergonomic error definitions.
 *
 * Merge degradation and per-sentence enrichment failures are deliberately
 * absent here: they are recovered locally and reported as data
 * (`MergeOutcome::Degraded`, `EnrichedSentence::issues`).
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The request did not finish within the configured timeout
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
}

impl ProviderError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) | Self::Timeout(_) => true,
            Self::RequestFailed(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }

    /// Map an HTTP error status and body to the matching variant
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(0)
        } else if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors that abort a pipeline run, or an on-demand analysis
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The source media could not be decoded or its audio could not be extracted
    #[error("Media extraction failed: {0}")]
    MediaExtraction(String),

    /// The timed segment source failed
    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// The on-demand analysis call failed
    #[error("Analysis failed: {0}")]
    AnalysisFailure(String),

    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
