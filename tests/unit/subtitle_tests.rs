/*!
 * Tests for subtitle track building and parsing
 */

use yomikaki::subtitle::{build_srt, build_vtt, parse_vtt, to_srt};
use yomikaki::transcript::{EnrichedSentence, TimeSpan};

fn enriched(index: usize, start: f64, end: f64, source: &str, translated: &str) -> EnrichedSentence {
    let mut sentence = EnrichedSentence::new(index, TimeSpan::new(start, end), source);
    sentence.translated_text = translated.to_string();
    sentence
}

fn lesson() -> Vec<EnrichedSentence> {
    vec![
        enriched(1, 0.0, 2.5, "こんにちは元気です", "你好，我很好"),
        enriched(2, 2.5, 4.125, "今日はいい天気ですね", "今天天气真好"),
        enriched(3, 4.125, 3725.4567, "また明日", ""),
    ]
}

/// Every sentence becomes one cue with the same index, timing and source text
#[test]
fn test_parseVtt_withBuiltTrack_shouldRecoverEverySentence() {
    let sentences = lesson();
    let cues = parse_vtt(&build_vtt(&sentences)).unwrap();

    assert_eq!(cues.len(), sentences.len());
    for (cue, sentence) in cues.iter().zip(&sentences) {
        assert_eq!(cue.index, sentence.index);
        assert_eq!(cue.start, sentence.start);
        assert_eq!(cue.end, sentence.end);
        assert_eq!(cue.source_text(), sentence.source_text);
    }
    assert_eq!(cues[0].translated_text(), Some("你好，我很好"));
    assert_eq!(cues[2].translated_text(), None);
    assert_eq!(cues[2].end, "01:02:05.456");
}

#[test]
fn test_buildVtt_withNoSentences_shouldWriteHeaderOnly() {
    assert_eq!(build_vtt(&[]), "WEBVTT\n\n");
    assert!(parse_vtt("WEBVTT\n\n").unwrap().is_empty());
}

/// Windows line endings and a byte order mark are accepted
#[test]
fn test_parseVtt_withCrlfAndBom_shouldParse() {
    let content = "\u{feff}WEBVTT\r\n\r\n1\r\n00:00:00.000 --> 00:00:01.000\r\n元気\r\nFine\r\n";
    let cues = parse_vtt(content).unwrap();

    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].lines, vec!["元気", "Fine"]);
}

#[test]
fn test_toSrt_shouldMatchBuildSrt() {
    let sentences = lesson();
    let cues = parse_vtt(&build_vtt(&sentences)).unwrap();

    let srt = to_srt(&cues);
    assert_eq!(srt, build_srt(&sentences));
    assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:02,500\nこんにちは元気です\n你好，我很好\n\n"));
}
