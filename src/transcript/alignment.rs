/*!
 * Content-aware sentence alignment.
 *
 * Walks the merged sentences against the concatenated segment text. Both
 * sides are compared without whitespace and punctuation, so a merge that
 * only re-splits and re-punctuates the transcript aligns exactly. Anything
 * else (rewritten, dropped or invented text) makes the alignment fail.
 */

use std::ops::Range;

use super::model::TimedSegment;

/// Keep only letters and digits
pub fn normalize(text: &str) -> Vec<char> {
    text.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Segment range consumed by each sentence, or `None` when the texts diverge
pub fn align(sentences: &[&str], segments: &[TimedSegment]) -> Option<Vec<Range<usize>>> {
    // (character, owning segment)
    let stream: Vec<(char, usize)> = segments
        .iter()
        .enumerate()
        .flat_map(|(index, segment)| normalize(&segment.text).into_iter().map(move |c| (c, index)))
        .collect();

    let mut cursor = 0;
    let mut ranges = Vec::with_capacity(sentences.len());

    for sentence in sentences {
        let chars = normalize(sentence);
        if chars.is_empty() {
            return None;
        }

        let end = cursor + chars.len();
        let window = stream.get(cursor..end)?;
        if !window.iter().map(|(c, _)| c).eq(chars.iter()) {
            return None;
        }

        let first = window[0].1;
        let last = window[window.len() - 1].1;
        ranges.push(first..last + 1);
        cursor = end;
    }

    (cursor == stream.len()).then_some(ranges)
}
