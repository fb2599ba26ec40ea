use anyhow::{anyhow, Result};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::transcript::model::EnrichedSentence;
use crate::transcript::reconciler::parse_timestamp;

// @module: Bilingual subtitle tracks (WebVTT build/parse, SRT export)

// @const: WebVTT cue timing line
static CUE_TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((?:\d{2,}:)?\d{2}:\d{2}[.,]\d{3})\s+-->\s+((?:\d{2,}:)?\d{2}:\d{2}[.,]\d{3})").unwrap()
});

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    // @field: 1-based cue number
    pub index: usize,

    // @field: Start timestamp, HH:MM:SS.mmm
    pub start: String,

    // @field: End timestamp, HH:MM:SS.mmm
    pub end: String,

    // @field: Text lines (source first, then translation)
    pub lines: Vec<String>,
}

impl SubtitleCue {
    /// Build the cue for an enriched sentence
    pub fn from_sentence(sentence: &EnrichedSentence) -> Self {
        let mut lines = vec![cue_text(&sentence.source_text)];
        let translated = cue_text(&sentence.translated_text);
        if !translated.is_empty() {
            lines.push(translated);
        }
        Self {
            index: sentence.index,
            start: sentence.start.clone(),
            end: sentence.end.clone(),
            lines,
        }
    }

    /// Source line of the cue
    pub fn source_text(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or_default()
    }

    /// Translated line of the cue, if present
    pub fn translated_text(&self) -> Option<&str> {
        self.lines.get(1).map(String::as_str)
    }

    /// Start time in seconds
    pub fn start_seconds(&self) -> Result<f64> {
        parse_timestamp(&self.start)
    }

    /// End time in seconds
    pub fn end_seconds(&self) -> Result<f64> {
        parse_timestamp(&self.end)
    }

    // @returns: Cue as an SRT block
    pub fn to_srt_block(&self) -> String {
        format!(
            "{}\n{} --> {}\n{}\n\n",
            self.index,
            self.start.replace('.', ","),
            self.end.replace('.', ","),
            self.lines.join("\n")
        )
    }
}

impl fmt::Display for SubtitleCue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.start, self.end)?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)
    }
}

/// Flatten text into a single cue line
///
/// Line breaks are folded into spaces and `-->` is written as `->`, since
/// either would break the cue structure on re-parse.
pub fn cue_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .replace("-->", "->")
}

/// Render enriched sentences as a WebVTT document
///
/// Each cue carries the sentence index, its timing, the Japanese line and
/// the translated line.
pub fn build_vtt(sentences: &[EnrichedSentence]) -> String {
    let mut output = String::from("WEBVTT\n\n");
    for sentence in sentences {
        output.push_str(&SubtitleCue::from_sentence(sentence).to_string());
    }
    output
}

/// Parse a WebVTT document into cues
///
/// Cues without a numeric identifier are numbered by position. `NOTE`,
/// `STYLE` and `REGION` blocks are skipped.
pub fn parse_vtt(content: &str) -> Result<Vec<SubtitleCue>> {
    let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let mut blocks = content.split("\n\n");

    let header = blocks.next().unwrap_or_default();
    if !header.trim_start().starts_with("WEBVTT") {
        return Err(anyhow!("Missing WEBVTT header"));
    }

    let mut cues = Vec::new();
    for block in blocks {
        let lines: Vec<&str> = block.lines().map(str::trim_end).filter(|l| !l.trim().is_empty()).collect();
        if lines.is_empty() {
            continue;
        }
        if ["NOTE", "STYLE", "REGION"].iter().any(|kw| lines[0].starts_with(kw)) {
            continue;
        }

        let (identifier, timing_at) = match CUE_TIMING_REGEX.is_match(lines[0]) {
            true => (None, 0),
            false => (Some(lines[0]), 1),
        };

        let Some(caps) = lines.get(timing_at).and_then(|l| CUE_TIMING_REGEX.captures(l)) else {
            warn!("Skipping malformed cue: {:?}", lines[0]);
            continue;
        };

        let index = identifier
            .and_then(|id| id.trim().parse::<usize>().ok())
            .unwrap_or(cues.len() + 1);

        cues.push(SubtitleCue {
            index,
            start: caps[1].replace(',', "."),
            end: caps[2].replace(',', "."),
            lines: lines[timing_at + 1..].iter().map(|l| l.to_string()).collect(),
        });
    }

    Ok(cues)
}

/// Render cues as an SRT document
pub fn to_srt(cues: &[SubtitleCue]) -> String {
    cues.iter().map(SubtitleCue::to_srt_block).collect()
}

/// Render enriched sentences as an SRT document
pub fn build_srt(sentences: &[EnrichedSentence]) -> String {
    let cues: Vec<SubtitleCue> = sentences.iter().map(SubtitleCue::from_sentence).collect();
    to_srt(&cues)
}
