/*!
 * Tests for application configuration functionality
 */

use yomikaki::app_config::{AssistantProvider, Config, LogLevel, TimestampStrategy};
use yomikaki::language_utils::DisplayLanguage;

use crate::common;

/// Test default configuration values
#[test]
fn test_defaultConfig_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "ja");
    assert_eq!(config.display_language, DisplayLanguage::Chinese);
    assert_eq!(config.transcription.model, "whisper-1");
    assert_eq!(config.transcription.timeout_secs, 300);
    assert_eq!(config.assistant.common.retry_count, 2);
    assert_eq!(config.pipeline.timestamp_strategy, TimestampStrategy::Positional);
    assert!((config.pipeline.preamble_similarity_threshold - 0.2).abs() < f64::EPSILON);
    assert!(!config.pipeline.write_srt);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// A missing config file is created with defaults, then loaded back
#[test]
fn test_loadOrCreate_withMissingFile_shouldCreateThenLoad() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("conf.json");

    let (created, was_created) = Config::load_or_create(&path).unwrap();
    assert!(was_created);
    assert!(path.exists());

    let (loaded, was_created) = Config::load_or_create(&path).unwrap();
    assert!(!was_created);
    assert_eq!(loaded.source_language, created.source_language);
    assert_eq!(loaded.assistant.provider, created.assistant.provider);
}

/// Partial files fill the missing sections with defaults
#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        br#"{"display_language":"korean","pipeline":{"timestamp_strategy":"content_aware"}}"#,
    )
    .unwrap();

    let (config, _) = Config::load_or_create(&path).unwrap();
    assert_eq!(config.display_language, DisplayLanguage::Korean);
    assert_eq!(config.pipeline.timestamp_strategy, TimestampStrategy::ContentAware);
    assert!((config.pipeline.preamble_similarity_threshold - 0.2).abs() < f64::EPSILON);
    assert_eq!(config.source_language, "ja");
}

#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(temp_dir.path(), "conf.json", b"{ not json").unwrap();
    assert!(Config::load_or_create(&path).is_err());
}

/// Test configuration validation
#[test]
fn test_validate_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = common::test_config();
    assert!(config.validate().is_ok());

    config.source_language = "not-a-language".to_string();
    assert!(config.validate().is_err());
    config.source_language = "ja".to_string();

    config.assistant.common.retry_count = 0;
    assert!(config.validate().is_err());
    config.assistant.common.retry_count = 2;

    config.assistant.active_provider_config_mut().concurrent_requests = 0;
    assert!(config.validate().is_err());
    config.assistant.active_provider_config_mut().concurrent_requests = 2;

    config.pipeline.preamble_similarity_threshold = 1.5;
    assert!(config.validate().is_err());
    config.pipeline.preamble_similarity_threshold = 0.2;

    config.assistant.provider = AssistantProvider::Anthropic;
    config.assistant.active_provider_config_mut().api_key = "sk-ant-test".to_string();
    assert!(config.validate().is_ok());
}
