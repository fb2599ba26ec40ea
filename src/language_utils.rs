use anyhow::{Result, anyhow};
use isolang::Language;
use serde::{Deserialize, Serialize};

/// Language utilities
///
/// ISO 639 code normalization for the source language reported by the
/// transcriber, and the fixed set of display languages a learner can pick
/// for translations and analyses.

/// Language a learner reads translations and analyses in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayLanguage {
    #[default]
    Chinese,
    English,
    Korean,
}

impl DisplayLanguage {
    /// All selectable display languages, in menu order
    pub const ALL: [DisplayLanguage; 3] = [Self::Chinese, Self::English, Self::Korean];

    /// ISO 639-1 code of the language
    pub fn code(&self) -> &'static str {
        match self {
            Self::Chinese => "zh",
            Self::English => "en",
            Self::Korean => "ko",
        }
    }

    /// Name of the language written in the language itself
    pub fn native_name(&self) -> &'static str {
        match self {
            Self::Chinese => "中文",
            Self::English => "English",
            Self::Korean => "한국어",
        }
    }

    /// Resolve a display language from an ISO code or a name
    pub fn from_code(code: &str) -> Result<Self> {
        let trimmed = code.trim();
        for lang in Self::ALL {
            if trimmed == lang.native_name() || trimmed.eq_ignore_ascii_case(&format!("{:?}", lang)) {
                return Ok(lang);
            }
            if language_codes_match(trimmed, lang.code()) {
                return Ok(lang);
            }
        }
        Err(anyhow!("Unsupported display language: {}", code))
    }
}

impl std::fmt::Display for DisplayLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.native_name())
    }
}

impl std::str::FromStr for DisplayLanguage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_code(s)
    }
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }

        // ISO 639-2/B codes that differ from 639-2/T
        match normalized_code.as_str() {
            "chi" => return Ok("zho".to_string()),
            "jpn" => return Ok("jpn".to_string()),
            "kor" => return Ok("kor".to_string()),
            _ => {}
        }
    } else if let Some(lang) = Language::from_name(code.trim()) {
        // Whisper reports the detected language by English name ("japanese")
        return Ok(lang.to_639_3().to_string());
    } else {
        let capitalized = capitalize(&normalized_code);
        if let Some(lang) = Language::from_name(&capitalized) {
            return Ok(lang.to_639_3().to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
