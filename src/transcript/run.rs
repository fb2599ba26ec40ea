/*!
 * Pipeline runs and the session that holds the current one.
 *
 * A `PipelineRun` is created once from a list of timed segments and is never
 * mutated afterwards. Processing another file builds a new run and replaces
 * the previous one in the `Session`.
 */

use chrono::Local;
use log::{debug, info};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::enrichment::EnrichmentPipeline;
use super::merger::SentenceMerger;
use super::model::{EnrichedSentence, MergeOutcome, MergedSentence, TimedSegment};
use super::reconciler;
use crate::app_config::{Config, TimestampStrategy};
use crate::language_utils::DisplayLanguage;
use crate::service::ChatCompletion;
use crate::subtitle;

/// Everything produced by one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Unique run identifier
    pub id: Uuid,
    /// Local creation time, RFC 3339
    pub created_at: String,
    /// Display language of the translations
    pub language: DisplayLanguage,
    /// Raw segments from the speech-to-text service
    pub segments: Vec<TimedSegment>,
    /// Sentences after merging, with alignment spans when available
    pub sentences: Vec<MergedSentence>,
    /// How the merge step finished
    pub merge_outcome: MergeOutcome,
    /// Enriched sentences in index order
    pub enriched: Vec<EnrichedSentence>,
    /// Failed enrichment calls
    pub enrichment_failures: usize,
}

impl PipelineRun {
    /// Render the run as a WebVTT document
    pub fn to_vtt(&self) -> String {
        subtitle::build_vtt(&self.enriched)
    }

    /// Look up an enriched sentence by its 1-based index
    pub fn sentence(&self, index: usize) -> Option<&EnrichedSentence> {
        index.checked_sub(1).and_then(|i| self.enriched.get(i))
    }

    /// Serializable transcript with run metadata
    pub fn to_document(&self, source: Option<String>) -> TranscriptDocument {
        TranscriptDocument {
            run_id: self.id.to_string(),
            created_at: self.created_at.clone(),
            source,
            display_language: self.language,
            segment_count: self.segments.len(),
            merge_outcome: self.merge_outcome.clone(),
            sentences: self.enriched.clone(),
        }
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        let merge = match &self.merge_outcome {
            MergeOutcome::Merged => "merged".to_string(),
            MergeOutcome::Degraded { reason } => format!("degraded ({})", reason),
        };
        format!(
            "{} segments -> {} sentences, merge {}, {} enrichment failures",
            self.segments.len(),
            self.enriched.len(),
            merge,
            self.enrichment_failures
        )
    }
}

/// JSON transcript written next to the subtitles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptDocument {
    pub run_id: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub display_language: DisplayLanguage,
    pub segment_count: usize,
    pub merge_outcome: MergeOutcome,
    pub sentences: Vec<EnrichedSentence>,
}

impl TranscriptDocument {
    /// Look up a sentence by its 1-based index
    pub fn sentence(&self, index: usize) -> Option<&EnrichedSentence> {
        self.sentences.iter().find(|s| s.index == index)
    }
}

/// Merge, reconcile and enrich timed segments
pub struct TranscriptPipeline {
    merger: SentenceMerger,
    enrichment: EnrichmentPipeline,
    strategy: TimestampStrategy,
    language: DisplayLanguage,
}

impl TranscriptPipeline {
    /// Build a pipeline from the configuration, with `client` for every language call
    pub fn new(client: Arc<dyn ChatCompletion>, config: &Config) -> Self {
        Self {
            merger: SentenceMerger::new(client.clone())
                .with_preamble_threshold(config.pipeline.preamble_similarity_threshold),
            enrichment: EnrichmentPipeline::new(client, config.display_language)
                .with_concurrency(config.assistant.get_concurrent_requests()),
            strategy: config.pipeline.timestamp_strategy,
            language: config.display_language,
        }
    }

    /// Run every step on `segments`
    pub async fn process(
        &self,
        mut segments: Vec<TimedSegment>,
        progress_callback: impl Fn(usize, usize) + Send + Sync,
    ) -> PipelineRun {
        let before = segments.len();
        segments.retain(|segment| !segment.text.trim().is_empty());
        if segments.len() < before {
            debug!("Ignoring {} blank segments", before - segments.len());
        }

        let merged = self.merger.merge(&segments).await;
        let mut sentences = merged.sentences;
        info!(
            "Merged {} segments into {} sentences",
            segments.len(),
            sentences.len()
        );

        let spans = reconciler::reconcile(&mut sentences, &segments, self.strategy);
        let report = self.enrichment.enrich_all(&sentences, &spans, progress_callback).await;

        PipelineRun {
            id: Uuid::new_v4(),
            created_at: Local::now().to_rfc3339(),
            language: self.language,
            segments,
            sentences,
            merge_outcome: merged.outcome,
            enriched: report.sentences,
            enrichment_failures: report.failures,
        }
    }
}

/// Holds at most one current run
#[derive(Debug, Default)]
pub struct Session {
    current: RwLock<Option<Arc<PipelineRun>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `run` as the current run, returning the one it replaced
    pub fn replace(&self, run: PipelineRun) -> Option<Arc<PipelineRun>> {
        self.current.write().replace(Arc::new(run))
    }

    /// The current run, if any
    pub fn current(&self) -> Option<Arc<PipelineRun>> {
        self.current.read().clone()
    }

    /// Drop the current run
    pub fn clear(&self) -> Option<Arc<PipelineRun>> {
        self.current.write().take()
    }
}
