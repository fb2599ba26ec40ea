/*!
 * Transcript segmentation and enrichment.
 *
 * - `model`: segments, sentences and enriched sentences
 * - `merger`: re-segmentation of raw segments into sentences
 * - `reconciler`: time spans and timestamp formatting
 * - `alignment`: content-aware mapping of sentences onto segments
 * - `enrichment`: translation and furigana per sentence
 * - `run`: the run context and the session holding it
 */

pub mod alignment;
pub mod enrichment;
pub mod merger;
pub mod model;
pub mod reconciler;
pub mod run;

pub use enrichment::{EnrichmentPipeline, EnrichmentReport};
pub use merger::{MergeResult, SentenceMerger};
pub use model::{EnrichedSentence, MergeOutcome, MergedSentence, TimeSpan, TimedSegment};
pub use reconciler::{format_timestamp, parse_timestamp};
pub use run::{PipelineRun, Session, TranscriptDocument, TranscriptPipeline};
