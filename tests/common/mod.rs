/*!
 * Common test utilities for the yomikaki test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use yomikaki::app_config::{AssistantProvider, Config};
use yomikaki::transcript::TimedSegment;


/// Route log output through the test harness, safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &[u8]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a placeholder audio file; audio is uploaded as-is so content is irrelevant
pub fn create_test_audio(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, b"ID3\x03\x00\x00\x00")
}

/// Build segments from `(text, start, end)` triples
pub fn segments(parts: &[(&str, f64, f64)]) -> Vec<TimedSegment> {
    parts
        .iter()
        .map(|(text, start, end)| TimedSegment::new(*text, *start, *end))
        .collect()
}

/// Three fragments of one greeting
pub fn greeting_segments() -> Vec<TimedSegment> {
    segments(&[("こんにちは", 0.0, 1.0), ("元気", 1.0, 2.0), ("です", 2.0, 2.5)])
}

/// Configuration that validates without API keys
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.assistant.provider = AssistantProvider::Ollama;
    config.assistant.common.retry_count = 1;
    config.assistant.common.retry_backoff_ms = 1;
    config
}
