/*!
 * Tests for the enrichment pipeline
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use yomikaki::errors::ProviderError;
use yomikaki::language_utils::DisplayLanguage;
use yomikaki::providers::mock::MockProvider;
use yomikaki::transcript::{EnrichmentPipeline, MergedSentence, TimeSpan};

use crate::common::mock_providers::{classroom_provider, request_kind, RequestKind};

fn sentences(texts: &[&str]) -> (Vec<MergedSentence>, Vec<TimeSpan>) {
    let merged = texts.iter().map(|t| MergedSentence::new(*t)).collect();
    let spans = (0..texts.len()).map(|i| TimeSpan::new(i as f64, i as f64 + 1.0)).collect();
    (merged, spans)
}

/// Results come back in index order whatever order the calls finish in
#[tokio::test]
async fn test_enrichAll_withConcurrency_shouldKeepIndexOrder() {
    let provider = classroom_provider("");
    let pipeline = EnrichmentPipeline::new(Arc::new(provider), DisplayLanguage::English).with_concurrency(3);
    let (merged, spans) = sentences(&["一つ目です", "二つ目です", "三つ目です", "四つ目です", "五つ目です"]);

    let progress = AtomicUsize::new(0);
    let report = pipeline
        .enrich_all(&merged, &spans, |done, total| {
            assert_eq!(total, 5);
            progress.fetch_max(done, Ordering::SeqCst);
        })
        .await;

    assert_eq!(report.failures, 0);
    assert_eq!(progress.load(Ordering::SeqCst), 5);
    let indexes: Vec<usize> = report.sentences.iter().map(|s| s.index).collect();
    assert_eq!(indexes, vec![1, 2, 3, 4, 5]);
    assert_eq!(report.sentences[2].translated_text, "[en] 三つ目です");
    assert_eq!(report.sentences[2].annotated_text, "<ruby>三つ目です<rt>よみ</rt></ruby>");
    assert_eq!(report.sentences[2].start, "00:00:02.000");
}

/// A failed translation leaves an empty translation and an issue, nothing else changes
#[tokio::test]
async fn test_enrichAll_whenTranslationFails_shouldIsolateFailure() {
    let provider = MockProvider::scripted(|request| match request_kind(request) {
        RequestKind::Translation(_) if request.user == "失敗" => Err(ProviderError::AuthenticationError("denied".to_string())),
        RequestKind::Translation(_) => Ok("ok".to_string()),
        _ => Ok(request.user.clone()),
    });
    let pipeline = EnrichmentPipeline::new(Arc::new(provider), DisplayLanguage::Chinese);
    let (merged, spans) = sentences(&["成功", "失敗", "成功"]);

    let report = pipeline.enrich_all(&merged, &spans, |_, _| {}).await;

    assert_eq!(report.failures, 1);
    assert_eq!(report.sentences.len(), 3);
    assert_eq!(report.sentences[1].translated_text, "");
    assert!(report.sentences[1].issues[0].starts_with("translation failed"));
    assert_eq!(report.sentences[1].annotated_text, "失敗");
    assert_eq!(report.sentences[0].translated_text, "ok");
    assert!(!report.sentences[2].has_issues());
}

/// A failed annotation keeps the plain source text
#[tokio::test]
async fn test_enrichSentence_whenAnnotationFails_shouldKeepSourceText() {
    let provider = MockProvider::scripted(|request| match request_kind(request) {
        RequestKind::Furigana => Err(ProviderError::Timeout(30)),
        _ => Ok("Hello".to_string()),
    });
    let pipeline = EnrichmentPipeline::new(Arc::new(provider), DisplayLanguage::English);

    let sentence = pipeline.enrich_sentence(1, "こんにちは", TimeSpan::new(0.0, 1.0)).await;

    assert_eq!(sentence.translated_text, "Hello");
    assert_eq!(sentence.annotated_text, "こんにちは");
    assert_eq!(sentence.issues.len(), 1);
}

/// Escaped ruby markup from the model is restored
#[tokio::test]
async fn test_enrichSentence_withEscapedMarkup_shouldUnescape() {
    let provider = MockProvider::scripted(|request| match request_kind(request) {
        RequestKind::Furigana => Ok("&lt;ruby&gt;元気&lt;rt&gt;げんき&lt;/rt&gt;&lt;/ruby&gt;です".to_string()),
        _ => Ok("I am fine".to_string()),
    });
    let pipeline = EnrichmentPipeline::new(Arc::new(provider), DisplayLanguage::English);

    let sentence = pipeline.enrich_sentence(1, "元気です", TimeSpan::new(0.0, 1.0)).await;
    assert_eq!(sentence.annotated_text, "<ruby>元気<rt>げんき</rt></ruby>です");
}
