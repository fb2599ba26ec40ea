/*!
 * Timestamp reconciler.
 *
 * Maps merged sentences back onto the timeline of the raw segments and
 * formats times as `HH:MM:SS.mmm`.
 */

use anyhow::{anyhow, Result};
use log::warn;

use super::alignment;
use super::model::{MergedSentence, TimeSpan, TimedSegment};
use crate::app_config::TimestampStrategy;

/// Positional time spans for `sentence_count` sentences
///
/// Sentence `i` (1-based) starts at the first segment's start when `i == 1`,
/// otherwise at the end of segment `i-1`; it ends at the end of segment `i`,
/// and the last sentence ends with the last segment. Indexes past the last
/// segment are clamped to it and `end` is never below `start`.
pub fn positional_spans(sentence_count: usize, segments: &[TimedSegment]) -> Vec<TimeSpan> {
    let Some(last) = segments.last() else {
        return vec![TimeSpan::new(0.0, 0.0); sentence_count];
    };
    let segment_at = |i: usize| &segments[i.min(segments.len() - 1)];

    (1..=sentence_count)
        .map(|i| {
            let start = if i == 1 {
                segments[0].start
            } else {
                segment_at(i - 1).end
            };
            let end = if i < sentence_count {
                segment_at(i).end
            } else {
                last.end
            };
            TimeSpan::new(start, end.max(start))
        })
        .collect()
}

/// Assign a time span to every merged sentence
///
/// With the content-aware strategy, sentences that align to segment text get
/// their `source_span` set; if alignment fails the positional spans are used.
pub fn reconcile(
    sentences: &mut [MergedSentence],
    segments: &[TimedSegment],
    strategy: TimestampStrategy,
) -> Vec<TimeSpan> {
    if strategy == TimestampStrategy::ContentAware {
        let texts: Vec<&str> = sentences.iter().map(|s| s.text.as_str()).collect();
        match alignment::align(&texts, segments) {
            Some(ranges) => {
                let spans = ranges
                    .iter()
                    .map(|range| TimeSpan::new(segments[range.start].start, segments[range.end - 1].end))
                    .collect();
                for (sentence, range) in sentences.iter_mut().zip(ranges) {
                    sentence.source_span = Some(range);
                }
                return spans;
            }
            None => warn!("Content-aware alignment failed, falling back to positional timestamps"),
        }
    }

    positional_spans(sentences.len(), segments)
}

/// Format seconds as `HH:MM:SS.mmm`, truncating sub-millisecond digits
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 { seconds } else { 0.0 };

    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    let millis = ((seconds.fract() * 1000.0) as u64).min(999);

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
}

/// Parse `HH:MM:SS.mmm` (or `MM:SS.mmm`, `,` accepted for `.`) into seconds
pub fn parse_timestamp(timestamp: &str) -> Result<f64> {
    let normalized = timestamp.trim().replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();

    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => ("0", *m, *s),
        _ => return Err(anyhow!("Invalid timestamp: {}", timestamp)),
    };

    let hours: u64 = hours.parse().map_err(|_| anyhow!("Invalid hours in timestamp: {}", timestamp))?;
    let minutes: u64 = minutes
        .parse()
        .map_err(|_| anyhow!("Invalid minutes in timestamp: {}", timestamp))?;
    let seconds: f64 = seconds
        .parse()
        .map_err(|_| anyhow!("Invalid seconds in timestamp: {}", timestamp))?;

    if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return Err(anyhow!("Timestamp component out of range: {}", timestamp));
    }

    Ok(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}
