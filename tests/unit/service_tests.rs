/*!
 * Tests for the retry policy and the language service
 */

use std::sync::atomic::{AtomicU32, Ordering};

use yomikaki::app_config::AssistantProvider;
use yomikaki::errors::ProviderError;
use yomikaki::service::{ChatCompletion, LanguageService, RetryPolicy};

use crate::common;

/// Transient failures are retried until the call succeeds
#[tokio::test]
async fn test_retryPolicy_withTransientFailures_shouldEventuallySucceed() {
    let attempts = AtomicU32::new(0);
    let policy = RetryPolicy::new(2, 1);

    let result = policy
        .run("test", || async {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ProviderError::RateLimitExceeded("slow down".to_string()))
            } else {
                Ok("done")
            }
        })
        .await;

    assert_eq!(result.unwrap(), "done");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

/// Retries stop after retry_count + 1 attempts
#[tokio::test]
async fn test_retryPolicy_whenAlwaysTransient_shouldGiveUpAfterAllAttempts() {
    let attempts = AtomicU32::new(0);
    let policy = RetryPolicy::new(1, 1);

    let result: Result<(), ProviderError> = policy
        .run("test", || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Timeout(1))
        })
        .await;

    assert!(matches!(result, Err(ProviderError::Timeout(1))));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

/// Authentication failures are returned without retrying
#[tokio::test]
async fn test_retryPolicy_withPermanentFailure_shouldNotRetry() {
    let attempts = AtomicU32::new(0);
    let policy = RetryPolicy::new(3, 1);

    let result: Result<(), ProviderError> = policy
        .run("test", || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::AuthenticationError("bad key".to_string()))
        })
        .await;

    assert!(matches!(result, Err(ProviderError::AuthenticationError(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_retryPolicy_backoff_shouldDoubleEachAttempt() {
    let policy = RetryPolicy::new(3, 250);
    assert_eq!(policy.backoff(0).as_millis(), 250);
    assert_eq!(policy.backoff(1).as_millis(), 500);
    assert_eq!(policy.backoff(2).as_millis(), 1000);
}

/// Keyless local providers can be created from the default configuration
#[test]
fn test_languageService_withLocalProviders_shouldBuildWithoutKeys() {
    let mut config = common::test_config();
    let service = LanguageService::new(&config.assistant).unwrap();
    assert_eq!(service.provider_name(), "Ollama");

    config.assistant.provider = AssistantProvider::LMStudio;
    let service = LanguageService::new(&config.assistant).unwrap();
    assert_eq!(service.provider_name(), "LM Studio");
    assert_eq!(service.model(), config.assistant.get_model());
}

/// A refused connection surfaces as a provider error, not a panic
#[tokio::test]
async fn test_languageService_withUnreachableServer_shouldReturnError() {
    let mut config = common::test_config();
    config.assistant.active_provider_config_mut().endpoint = "http://127.0.0.1:9".to_string();
    config.assistant.active_provider_config_mut().timeout_secs = 5;

    let service = LanguageService::new(&config.assistant).unwrap();
    let result = service.complete("system", "こんにちは").await;

    assert!(result.is_err());
}
