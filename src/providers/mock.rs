/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockProvider::working()` - Always succeeds, echoing the user prompt
 * - `MockProvider::intermittent(n)` - Fails every nth request
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::scripted(f)` - Answers through a custom responder
 *
 * Every request is recorded so tests can assert on what the pipeline sent.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::service::ChatCompletion;

/// Mock request for testing
#[derive(Debug, Clone, PartialEq)]
pub struct MockRequest {
    /// System prompt
    pub system: String,
    /// User prompt
    pub user: String,
}

/// Mock response for testing
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// The generated text
    pub text: String,
}

/// Custom response generator
pub type Responder = Arc<dyn Fn(&MockRequest) -> Result<String, ProviderError> + Send + Sync>;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns empty response
    Empty,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock provider for testing pipeline behavior
#[derive(Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every request received, in order
    requests: Arc<Mutex<Vec<MockRequest>>>,
    /// Custom response generator (optional)
    responder: Option<Responder>,
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("behavior", &self.behavior)
            .field("request_count", &self.request_count.load(Ordering::SeqCst))
            .field("scripted", &self.responder.is_some())
            .finish()
    }
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            responder: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent {
            fail_every: fail_every.max(1),
        })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that waits before answering
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Create a working mock that answers through `responder`
    pub fn scripted<F>(responder: F) -> Self
    where
        F: Fn(&MockRequest) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self::working().with_responder(responder)
    }

    /// Set a custom response generator
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&MockRequest) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        self.responder = Some(Arc::new(responder));
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Snapshot of the requests received so far
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    fn respond(&self, request: &MockRequest) -> Result<MockResponse, ProviderError> {
        let text = match &self.responder {
            Some(responder) => responder(request)?,
            None => request.user.clone(),
        };
        Ok(MockResponse { text })
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = MockRequest;
    type Response = MockResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        match self.behavior {
            MockBehavior::Working => self.respond(&request),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    self.respond(&request)
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Ok(MockResponse { text: String::new() }),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                self.respond(&request)
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated provider failure".to_string())),
            _ => Ok(()),
        }
    }

    fn extract_text(response: &Self::Response) -> String {
        response.text.clone()
    }
}

#[async_trait]
impl ChatCompletion for MockProvider {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let request = MockRequest {
            system: system.to_string(),
            user: user.to_string(),
        };
        Provider::complete(self, request)
            .await
            .map(|response| Self::extract_text(&response))
    }
}
