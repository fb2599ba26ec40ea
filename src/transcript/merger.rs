/*!
 * Sentence merger.
 *
 * Speech recognition splits speech into arbitrary chunks. The merger asks a
 * chat model to re-segment the numbered chunk list into one sentence per
 * line, then cleans the answer: list markers are stripped, blank lines are
 * dropped and a leading explanatory line ("Sure, here are the sentences")
 * is removed when it does not resemble the first chunk.
 *
 * The merger never fails: on any collaborator error, or an answer without a
 * usable line, it falls back to one sentence per raw segment.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use super::model::{MergeOutcome, MergedSentence, TimedSegment};
use crate::prompts;
use crate::service::ChatCompletion;

/// Default ratio below which the first returned line is treated as a preamble
pub const DEFAULT_PREAMBLE_THRESHOLD: f64 = 0.2;

// "1. " / "12、" at line start
static ENUMERATION_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+[.、]\s*").unwrap());

// "- " / "* " / "・"
static BULLET_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:[-*]\s+|・\s*)").unwrap());

/// Result of one merge
#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult {
    pub sentences: Vec<MergedSentence>,
    pub outcome: MergeOutcome,
}

/// Re-segments raw timed segments into sentences
pub struct SentenceMerger {
    client: Arc<dyn ChatCompletion>,
    preamble_threshold: f64,
}

impl SentenceMerger {
    pub fn new(client: Arc<dyn ChatCompletion>) -> Self {
        Self {
            client,
            preamble_threshold: DEFAULT_PREAMBLE_THRESHOLD,
        }
    }

    /// Set the similarity threshold for preamble removal
    pub fn with_preamble_threshold(mut self, threshold: f64) -> Self {
        self.preamble_threshold = threshold;
        self
    }

    /// Merge the segments into sentences
    pub async fn merge(&self, segments: &[TimedSegment]) -> MergeResult {
        let raw: Vec<String> = segments
            .iter()
            .map(|s| s.text.trim().to_string())
            .filter(|text| !text.is_empty())
            .collect();

        if raw.is_empty() {
            return MergeResult {
                sentences: Vec::new(),
                outcome: MergeOutcome::Merged,
            };
        }

        let prompt = prompts::merge_prompt(&raw);
        let response = match self.client.complete(&prompt.system, &prompt.user).await {
            Ok(response) => response,
            Err(e) => return Self::fallback(raw, format!("merge request failed: {}", e)),
        };

        let mut lines = parse_merged_lines(&response);

        if let Some(first) = lines.first() {
            let ratio = similarity_ratio(&raw[0], first);
            if ratio < self.preamble_threshold {
                debug!("Dropping leading line {:?} (similarity {:.3})", first, ratio);
                lines.remove(0);
            }
        }

        if lines.is_empty() {
            return Self::fallback(raw, "merge response contained no usable lines".to_string());
        }

        debug!("Merged {} segments into {} sentences", raw.len(), lines.len());
        MergeResult {
            sentences: lines.into_iter().map(MergedSentence::new).collect(),
            outcome: MergeOutcome::Merged,
        }
    }

    fn fallback(raw: Vec<String>, reason: String) -> MergeResult {
        warn!("Sentence merge degraded, using raw segments: {}", reason);
        MergeResult {
            sentences: raw.into_iter().map(MergedSentence::new).collect(),
            outcome: MergeOutcome::Degraded { reason },
        }
    }
}

/// Strip a leading enumeration or bullet marker from a trimmed line
pub fn strip_list_marker(line: &str) -> String {
    let line = line.trim();
    let line = ENUMERATION_MARKER.replace(line, "");
    let line = BULLET_MARKER.replace(&line, "");
    line.trim().to_string()
}

/// Split a merge response into cleaned, non-blank lines
pub fn parse_merged_lines(response: &str) -> Vec<String> {
    response
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Character-level similarity in [0, 1]
///
/// `2 * M / T`, where `M` counts the characters in matching blocks found by
/// repeatedly taking the longest common substring and recursing on both
/// sides of it, and `T` is the combined length. Two empty strings are equal.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size > 0 {
            matched += size;
            pending.push((alo, i, blo, j));
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common substring of `a[alo..ahi]` and `b[blo..bhi]`, earliest on ties
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);
    let width = bhi.saturating_sub(blo);
    let mut previous = vec![0usize; width + 1];

    for i in alo..ahi {
        let mut current = vec![0usize; width + 1];
        for j in blo..bhi {
            if a[i] == b[j] {
                let size = previous[j - blo] + 1;
                current[j - blo + 1] = size;
                if size > best.2 {
                    best = (i + 1 - size, j + 1 - size, size);
                }
            }
        }
        previous = current;
    }

    best
}
