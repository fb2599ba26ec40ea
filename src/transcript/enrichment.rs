/*!
 * Sentence enrichment.
 *
 * Every merged sentence gets two independent collaborator calls, a
 * translation into the display language and a furigana annotation. The two
 * calls of one sentence run together and sentences run concurrently. A
 * shared semaphore bounds the number of collaborator calls in flight, and
 * the result comes back in index order.
 *
 * A failed call never aborts the run. The sentence keeps an empty
 * translation or its plain source text, and the failure is recorded in its
 * `issues`.
 */

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::model::{EnrichedSentence, MergedSentence, TimeSpan};
use crate::language_utils::DisplayLanguage;
use crate::errors::ProviderError;
use crate::prompts;
use crate::service::ChatCompletion;

/// Outcome of enriching all sentences of a run
#[derive(Debug, Clone, Default)]
pub struct EnrichmentReport {
    /// Sentences in index order
    pub sentences: Vec<EnrichedSentence>,
    /// Number of failed calls across all sentences
    pub failures: usize,
}

/// Translates and annotates merged sentences
pub struct EnrichmentPipeline {
    client: Arc<dyn ChatCompletion>,
    language: DisplayLanguage,
    max_concurrent_requests: usize,
    requests: Arc<Semaphore>,
}

impl EnrichmentPipeline {
    pub fn new(client: Arc<dyn ChatCompletion>, language: DisplayLanguage) -> Self {
        Self {
            client,
            language,
            max_concurrent_requests: 4,
            requests: Arc::new(Semaphore::new(4)),
        }
    }

    /// Set the number of collaborator calls allowed in flight
    pub fn with_concurrency(mut self, max_concurrent_requests: usize) -> Self {
        self.max_concurrent_requests = max_concurrent_requests.max(1);
        self.requests = Arc::new(Semaphore::new(self.max_concurrent_requests));
        self
    }

    /// Enrich every sentence with its span
    ///
    /// `sentences` and `spans` are paired by position. `progress_callback`
    /// receives (completed, total) after each sentence.
    pub async fn enrich_all(
        &self,
        sentences: &[MergedSentence],
        spans: &[TimeSpan],
        progress_callback: impl Fn(usize, usize) + Send + Sync,
    ) -> EnrichmentReport {
        let total = sentences.len().min(spans.len());
        if sentences.len() != spans.len() {
            warn!(
                "Sentence count {} does not match span count {}, enriching {}",
                sentences.len(),
                spans.len(),
                total
            );
        }

        let completed = AtomicUsize::new(0);
        let progress_callback = &progress_callback;
        let completed = &completed;

        let mut enriched = stream::iter(sentences.iter().zip(spans.iter()).enumerate())
            .map(|(position, (sentence, span))| {
                async move {
                    let result = self.enrich_sentence(position + 1, &sentence.text, *span).await;
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(done, total);
                    result
                }
            })
            .buffer_unordered(self.max_concurrent_requests)
            .collect::<Vec<_>>()
            .await;

        enriched.sort_by_key(|sentence| sentence.index);
        let failures = enriched.iter().map(|sentence| sentence.issues.len()).sum();

        EnrichmentReport {
            sentences: enriched,
            failures,
        }
    }

    /// Translate and annotate one sentence
    pub async fn enrich_sentence(&self, index: usize, text: &str, span: TimeSpan) -> EnrichedSentence {
        let mut sentence = EnrichedSentence::new(index, span, text);

        let translation = prompts::translation_prompt(text, self.language);
        let furigana = prompts::furigana_prompt(text);
        let (translated, annotated) = tokio::join!(
            self.call(&translation.system, &translation.user),
            self.call(&furigana.system, &furigana.user),
        );

        match translated {
            Ok(translated) => sentence.translated_text = translated.trim().to_string(),
            Err(e) => {
                warn!("Translation of sentence {} failed: {}", index, e);
                sentence.issues.push(format!("translation failed: {}", e));
            }
        }

        match annotated {
            Ok(annotated) => {
                let annotated = unescape_markup(annotated.trim());
                if !annotated.is_empty() {
                    sentence.annotated_text = annotated;
                }
            }
            Err(e) => {
                warn!("Furigana annotation of sentence {} failed: {}", index, e);
                sentence.issues.push(format!("annotation failed: {}", e));
            }
        }

        debug!("Enriched sentence {}: {}", index, sentence.source_text);
        sentence
    }

    async fn call(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        // The semaphore is never closed
        let _permit = self.requests.acquire().await.ok();
        self.client.complete(system, user).await
    }
}

/// Undo HTML entity escaping some models apply to ruby markup
pub fn unescape_markup(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
