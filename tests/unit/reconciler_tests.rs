/*!
 * Tests for timestamp reconciliation
 */

use yomikaki::app_config::TimestampStrategy;
use yomikaki::transcript::reconciler::{positional_spans, reconcile};
use yomikaki::transcript::{format_timestamp, parse_timestamp, MergedSentence};

use crate::common;

fn merged(texts: &[&str]) -> Vec<MergedSentence> {
    texts.iter().map(|t| MergedSentence::new(*t)).collect()
}

/// With no more sentences than segments, starts never go backwards and ends never precede starts
#[test]
fn test_positionalSpans_withFewerSentences_shouldBeMonotonic() {
    let segments = common::segments(&[
        ("a", 0.0, 1.2),
        ("b", 1.2, 2.0),
        ("c", 2.4, 3.1),
        ("d", 3.1, 3.1),
        ("e", 4.0, 5.5),
    ]);

    for count in 1..=segments.len() {
        let spans = positional_spans(count, &segments);
        assert_eq!(spans.len(), count);
        for pair in spans.windows(2) {
            assert!(pair[0].start <= pair[1].start, "starts must be non-decreasing for {} sentences", count);
        }
        for span in &spans {
            assert!(span.end >= span.start);
        }
        assert_eq!(spans[count - 1].end, 5.5);
    }
}

/// More sentences than segments are clamped to the last segment
#[test]
fn test_positionalSpans_withMoreSentences_shouldClampToLastSegment() {
    let segments = common::segments(&[("a", 0.0, 1.0), ("b", 1.0, 2.0)]);
    let spans = positional_spans(4, &segments);

    assert_eq!(spans.len(), 4);
    assert_eq!(spans[3].start, 2.0);
    assert_eq!(spans[3].end, 2.0);
}

/// Content-aware alignment spans the segments each sentence consumed
#[test]
fn test_reconcile_contentAware_shouldSpanConsumedSegments() {
    let segments = common::segments(&[
        ("こんにちは", 0.0, 1.0),
        ("元気", 1.5, 2.0),
        ("です", 2.0, 2.5),
        ("ありがとう", 3.0, 4.0),
    ]);
    let mut sentences = merged(&["こんにちは。", "元気です。", "ありがとう"]);

    let spans = reconcile(&mut sentences, &segments, TimestampStrategy::ContentAware);

    assert_eq!((spans[1].start, spans[1].end), (1.5, 2.5));
    assert_eq!(sentences[1].source_span, Some(1..3));
    assert_eq!((spans[2].start, spans[2].end), (3.0, 4.0));
}

/// Rewritten text cannot be aligned and falls back to positional spans
#[test]
fn test_reconcile_contentAware_withRewrittenText_shouldFallBackToPositional() {
    let segments = common::greeting_segments();
    let mut sentences = merged(&["さようなら"]);

    let spans = reconcile(&mut sentences, &segments, TimestampStrategy::ContentAware);

    assert_eq!(spans, positional_spans(1, &segments));
    assert_eq!(sentences[0].source_span, None);
}

#[test]
fn test_formatTimestamp_shouldTruncateToMilliseconds() {
    assert_eq!(format_timestamp(3725.4567), "01:02:05.456");
    assert_eq!(format_timestamp(0.0), "00:00:00.000");
    assert_eq!(format_timestamp(2.5), "00:00:02.500");
}

#[test]
fn test_parseTimestamp_shouldAcceptVttAndSrtForms() {
    assert!((parse_timestamp("01:02:05.456").unwrap() - 3725.456).abs() < 1e-9);
    assert!((parse_timestamp("00:01,250").unwrap() - 1.25).abs() < 1e-9);
    assert!(parse_timestamp("1:75:00.000").is_err());
}
