/*!
 * Timed segment source.
 *
 * Turns an audio file into ordered, time-coded segments of recognized
 * speech. The default implementation uploads the audio to an
 * OpenAI-compatible `/audio/transcriptions` endpoint and reads the
 * `verbose_json` segments.
 */

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{info, warn};
use std::path::Path;
use std::time::Duration;

use crate::app_config::TranscriptionConfig;
use crate::errors::PipelineError;
use crate::language_utils;
use crate::providers::openai::{OpenAI, TranscriptionRequest, VerboseTranscription};
use crate::service::{normalize_endpoint, RetryPolicy};
use crate::transcript::model::TimedSegment;

/// Output of a transcription
#[derive(Debug, Clone, PartialEq)]
pub struct Transcription {
    /// Language reported by the service, if any
    pub language: Option<String>,
    /// Segments in chronological order
    pub segments: Vec<TimedSegment>,
}

/// Converts audio into timed segments
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<Transcription, PipelineError>;
}

/// Whisper transcription over an OpenAI-compatible API
#[derive(Debug)]
pub struct WhisperTranscriber {
    client: OpenAI,
    request: TranscriptionRequest,
    retry: RetryPolicy,
}

impl WhisperTranscriber {
    /// Create a transcriber for `source_language` (ISO code)
    pub fn new(config: &TranscriptionConfig, source_language: &str, retry: RetryPolicy) -> Result<Self> {
        let api_key = config.resolve_api_key();
        if api_key.is_empty() {
            return Err(anyhow!("An API key is required for transcription (set OPENAI_API_KEY)"));
        }

        let endpoint = normalize_endpoint(&config.endpoint)?;
        // Whisper takes ISO 639-1 hints
        let language = isolang::Language::from_639_1(source_language)
            .or_else(|| isolang::Language::from_639_3(source_language))
            .and_then(|lang| lang.to_639_1())
            .map(str::to_string);

        Ok(Self {
            client: OpenAI::with_timeout(
                api_key,
                endpoint,
                config.model.clone(),
                Duration::from_secs(config.timeout_secs),
            ),
            request: TranscriptionRequest {
                model: config.model.clone(),
                language,
            },
            retry,
        })
    }
}

/// Convert a `verbose_json` response into chronological segments
///
/// A response without segments but with text becomes one segment spanning
/// the reported duration. Segments with blank text are dropped.
pub fn segments_from_response(response: VerboseTranscription) -> Vec<TimedSegment> {
    let mut segments: Vec<TimedSegment> = match response.segments {
        Some(segments) => segments
            .into_iter()
            .filter(|s| !s.text.trim().is_empty())
            .map(|s| TimedSegment::new(s.text.trim(), s.start, s.end))
            .collect(),
        None if !response.text.trim().is_empty() => vec![TimedSegment::new(
            response.text.trim(),
            0.0,
            response.duration.unwrap_or(0.0),
        )],
        None => Vec::new(),
    };

    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    segments
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<Transcription, PipelineError> {
        info!("Transcribing {:?} with {}", audio, self.request.model);

        let response = self
            .retry
            .run("Transcription request", || self.client.transcribe(audio, &self.request))
            .await
            .map_err(|e| PipelineError::Transcription(e.to_string()))?;

        let language = response.language.clone();
        if let (Some(detected), Some(expected)) = (&language, &self.request.language) {
            let matches = language_utils::normalize_to_part2t(detected)
                .map(|code| language_utils::language_codes_match(&code, expected))
                .unwrap_or(false);
            if !matches {
                warn!("Detected language {} differs from expected {}", detected, expected);
            }
        }

        let segments = segments_from_response(response);
        info!("Received {} segments", segments.len());

        Ok(Transcription { language, segments })
    }
}
