/*!
 * Transcript data model.
 *
 * A run moves data strictly forward: timed segments from the speech-to-text
 * service are merged into sentences, each sentence gets a time span, and each
 * span is enriched with a translation and a furigana annotation.
 */

use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::reconciler::format_timestamp;

/// A time-coded chunk of recognized speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedSegment {
    /// Recognized text
    pub text: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl TimedSegment {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// One linguistically complete sentence produced by the merger
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSentence {
    pub text: String,
    /// Segments this sentence was aligned to, set by content-aware alignment only
    pub source_span: Option<Range<usize>>,
}

impl MergedSentence {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_span: None,
        }
    }
}

/// Start and end of a sentence, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSpan {
    pub start: f64,
    pub end: f64,
}

impl TimeSpan {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// How the merge step finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// The collaborator output was used
    Merged,
    /// The raw segments were used, one sentence each
    Degraded { reason: String },
}

impl MergeOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// A fully enriched sentence, ready for subtitles and the transcript view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedSentence {
    /// 1-based position in the run
    pub index: usize,
    /// `HH:MM:SS.mmm`
    pub start: String,
    /// `HH:MM:SS.mmm`
    pub end: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    /// Japanese sentence
    pub source_text: String,
    /// Translation into the display language, empty when the call failed
    pub translated_text: String,
    /// Source text with `<ruby>` furigana markup
    pub annotated_text: String,
    /// Enrichment failures for this sentence
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl EnrichedSentence {
    /// Create a sentence with empty enrichment
    pub fn new(index: usize, span: TimeSpan, source_text: impl Into<String>) -> Self {
        let source_text = source_text.into();
        Self {
            index,
            start: format_timestamp(span.start),
            end: format_timestamp(span.end),
            start_seconds: span.start,
            end_seconds: span.end,
            annotated_text: source_text.clone(),
            source_text,
            translated_text: String::new(),
            issues: Vec::new(),
        }
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}
