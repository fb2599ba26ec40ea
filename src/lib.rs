/*!
 * # Yomikaki - Japanese listening companion
 *
 * A Rust library that turns Japanese audio and video into study material.
 *
 * ## Features
 *
 * - Transcribe media into timed segments (OpenAI-compatible Whisper API)
 * - Merge fragmentary segments into grammatically complete sentences
 * - Map merged sentences back onto segment timestamps
 * - Translate each sentence and annotate it with furigana, concurrently
 * - Write bilingual WebVTT subtitles, a JSON transcript and optional SRT
 * - Explain the vocabulary and grammar of a single sentence on demand
 * - Chat models from several providers:
 *   - OpenAI API
 *   - Anthropic API
 *   - Ollama (local LLM)
 *   - LM Studio (OpenAI-compatible local server)
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `media`: Media detection and audio extraction
 * - `transcription`: Speech-to-text into timed segments
 * - `transcript`: Sentence merging, timestamp reconciliation and enrichment:
 *   - `transcript::merger`: Segment re-grouping into sentences
 *   - `transcript::reconciler`: Time spans and timestamp formatting
 *   - `transcript::enrichment`: Translation and furigana per sentence
 *   - `transcript::run`: Pipeline runs and the session holding them
 * - `subtitle`: WebVTT and SRT tracks
 * - `analysis`: On-demand sentence analysis
 * - `prompts`: Instructions sent to the chat model
 * - `service`: Provider dispatch with timeout and retry
 * - `providers`: Client implementations for various LLM providers:
 *   - `providers::openai`: OpenAI API client (chat and transcription)
 *   - `providers::anthropic`: Anthropic API client
 *   - `providers::ollama`: Ollama API client
 *   - `providers::mock`: Scripted provider for tests
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language codes and display languages
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod analysis;
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod media;
pub mod prompts;
pub mod providers;
pub mod service;
pub mod subtitle;
pub mod transcript;
pub mod transcription;

// Re-export main types for easier usage
pub use analysis::Analyzer;
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, PipelineError, ProviderError};
pub use language_utils::{language_codes_match, normalize_to_part2t, get_language_name, DisplayLanguage};
pub use service::{ChatCompletion, LanguageService};
pub use transcript::{EnrichedSentence, PipelineRun, TimedSegment, TranscriptPipeline};
pub use transcription::{Transcriber, Transcription};
