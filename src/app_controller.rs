use anyhow::{anyhow, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::analysis::Analyzer;
use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::media::MediaProcessor;
use crate::service::{ChatCompletion, LanguageService, RetryPolicy};
use crate::subtitle;
use crate::transcript::{PipelineRun, Session, TimedSegment, TranscriptDocument, TranscriptPipeline};
use crate::transcription::{Transcriber, WhisperTranscriber};

// @module: Application controller for media processing and analysis

// @const: Language suffix of the subtitle track
const SUBTITLE_SUFFIX: &str = "ja";

// @const: Suffix of the JSON transcript
const TRANSCRIPT_SUFFIX: &str = "transcript";

// @const: Issues log written next to the outputs
const ISSUES_LOG: &str = "yomikaki.issues.log";

/// Files written for one processed media file
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFiles {
    pub subtitles: PathBuf,
    pub transcript: PathBuf,
    pub srt: Option<PathBuf>,
}

/// Counts of a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Sentence selected for analysis
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisTarget {
    /// 1-based sentence index in a transcript
    Index(usize),
    /// Free text
    Sentence(String),
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Chat model used by merge, enrichment and analysis
    assistant: Arc<dyn ChatCompletion>,

    // @field: Speech-to-text service
    transcriber: Arc<dyn Transcriber>,

    // @field: Audio preparation
    media: MediaProcessor,

    // @field: Holds the most recent run
    session: Session,
}

impl Controller {
    // @method: Create a controller backed by the configured services
    pub fn with_config(config: Config) -> Result<Self> {
        let assistant = LanguageService::new(&config.assistant)
            .context("Failed to create language service")?;
        info!(
            "Assistant: {} - {}",
            assistant.provider_name(),
            assistant.model()
        );

        let retry = RetryPolicy::new(
            config.assistant.common.retry_count,
            config.assistant.common.retry_backoff_ms,
        );
        let transcriber = WhisperTranscriber::new(&config.transcription, &config.source_language, retry)
            .context("Failed to create transcriber")?;

        Ok(Self::with_services(config, Arc::new(assistant), Arc::new(transcriber)))
    }

    // @method: Create a controller with explicit services
    pub fn with_services(
        config: Config,
        assistant: Arc<dyn ChatCompletion>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            config,
            assistant,
            transcriber,
            media: MediaProcessor::default(),
            session: Session::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Session holding the most recent run
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Path of the subtitle track written for `input_file`
    pub fn subtitle_output_path(input_file: &Path, output_dir: &Path) -> PathBuf {
        FileManager::generate_output_path(input_file, output_dir, SUBTITLE_SUFFIX, "vtt")
    }

    /// Path of the JSON transcript written for `input_file`
    pub fn transcript_output_path(input_file: &Path, output_dir: &Path) -> PathBuf {
        FileManager::generate_output_path(input_file, output_dir, TRANSCRIPT_SUFFIX, "json")
    }

    /// Run the pipeline on one media file
    ///
    /// Returns `None` when the outputs already exist and `force_overwrite` is off.
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<Option<OutputFiles>> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&input_file, &output_dir, &multi_progress, force_overwrite).await
    }

    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_dir: &Path,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<Option<OutputFiles>> {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        FileManager::ensure_dir(output_dir)?;

        let subtitle_path = Self::subtitle_output_path(input_file, output_dir);
        if subtitle_path.exists() && !force_overwrite {
            warn!("Skipping file, subtitles already exist (use -f to force overwrite)");
            return Ok(None);
        }

        let audio = self.media.prepare_audio(input_file).await?;
        if audio.is_extracted() {
            debug!("Using extracted audio {:?}", audio.path());
        }
        let transcription = self.transcriber.transcribe(audio.path()).await?;
        drop(audio);
        let transcription_elapsed = start_time.elapsed();

        if transcription.segments.is_empty() {
            warn!("No speech was recognized in {:?}", input_file);
        }

        let pipeline_start = Instant::now();
        let run = self.process_segments(transcription.segments, multi_progress).await;
        let pipeline_elapsed = pipeline_start.elapsed();

        if run.merge_outcome.is_degraded() {
            warn!("Sentence merging degraded, subtitles follow the raw segments");
        }

        let outputs = self.write_outputs(&run, input_file, output_dir)?;
        info!("{}", run.summary());
        info!(
            "Success: {} - Transcription: {} - Enrichment: {}",
            outputs.subtitles.display(),
            Self::format_duration(transcription_elapsed),
            Self::format_duration(pipeline_elapsed)
        );

        if let Some(previous) = self.session.replace(run) {
            debug!("Replaced run {}", previous.id);
        }

        Ok(Some(outputs))
    }

    /// Merge, reconcile and enrich segments with a progress bar
    async fn process_segments(&self, segments: Vec<TimedSegment>, multi_progress: &MultiProgress) -> PipelineRun {
        let pipeline = TranscriptPipeline::new(self.assistant.clone(), &self.config);

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        progress_bar.set_style(Self::progress_style("sentences"));
        progress_bar.set_message("Enriching");

        let pb = progress_bar.clone();
        let run = pipeline
            .process(segments, move |completed, total| {
                pb.set_length(total as u64);
                pb.set_position(completed as u64);
            })
            .await;

        progress_bar.finish_and_clear();
        run
    }

    fn progress_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }

    /// Write the subtitle track, the transcript and the optional SRT copy
    fn write_outputs(&self, run: &PipelineRun, input_file: &Path, output_dir: &Path) -> Result<OutputFiles> {
        let subtitles = Self::subtitle_output_path(input_file, output_dir);
        FileManager::write_to_file(&subtitles, &run.to_vtt())?;

        let transcript = Self::transcript_output_path(input_file, output_dir);
        let source = input_file.file_name().map(|name| name.to_string_lossy().to_string());
        let document = serde_json::to_string_pretty(&run.to_document(source))
            .context("Failed to serialize transcript")?;
        FileManager::write_to_file(&transcript, &document)?;

        let srt = if self.config.pipeline.write_srt {
            let path = FileManager::generate_output_path(input_file, output_dir, SUBTITLE_SUFFIX, "srt");
            FileManager::write_to_file(&path, &subtitle::build_srt(&run.enriched))?;
            Some(path)
        } else {
            None
        };

        if run.enrichment_failures > 0 {
            self.write_issues(run, input_file, output_dir);
        }

        Ok(OutputFiles {
            subtitles,
            transcript,
            srt,
        })
    }

    fn write_issues(&self, run: &PipelineRun, input_file: &Path, output_dir: &Path) {
        let log_path = output_dir.join(ISSUES_LOG);
        let mut lines = vec![format!(
            "{} - run {} - {} failed enrichment calls",
            input_file.display(),
            run.id,
            run.enrichment_failures
        )];
        for sentence in run.enriched.iter().filter(|s| s.has_issues()) {
            lines.push(format!("  #{} {}: {}", sentence.index, sentence.source_text, sentence.issues.join("; ")));
        }

        if let Err(e) = FileManager::append_to_log_file(&log_path, &lines.join("\n")) {
            warn!("Failed to write issues log: {}", e);
        } else {
            info!("Issues written to {}", log_path.display());
        }
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }

    /// Run the pipeline on every media file below `input_dir`
    ///
    /// Outputs are written next to each file. Files that already have
    /// subtitles are skipped unless `force_overwrite` is set.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let media_files = FileManager::find_media_files(&input_dir)?;
        if media_files.is_empty() {
            return Err(anyhow!("No media files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(media_files.len() as u64));
        folder_pb.set_style(Self::progress_style("files"));
        folder_pb.set_message("Processing files");

        let mut summary = FolderSummary::default();

        for media_file in &media_files {
            let file_name = media_file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_dir = media_file.parent().map(Path::to_path_buf).unwrap_or_else(|| input_dir.clone());

            match self.run_with_progress(media_file, &output_dir, &multi_progress, force_overwrite).await {
                Ok(Some(_)) => summary.processed += 1,
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {}", file_name, e);
                    summary.failed += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        let message = format!(
            "Folder processing completed: {} processed, {} skipped, {} errors",
            summary.processed, summary.skipped, summary.failed
        );
        info!("{}", message);

        let log_path = input_dir.join(ISSUES_LOG);
        let entry = format!("{} - Duration: {}", message, Self::format_duration(start_time.elapsed()));
        if let Err(e) = FileManager::append_to_log_file(&log_path, &entry) {
            warn!("Failed to write folder log: {}", e);
        }

        Ok(summary)
    }

    /// Analyze a sentence, answering in the configured display language
    pub async fn analyze(&self, sentence: &str) -> Result<String> {
        let analyzer = Analyzer::new(self.assistant.clone());
        let analysis = analyzer.analyze(sentence, self.config.display_language).await?;
        Ok(analysis)
    }

    /// Analyze a sentence of the current run by its 1-based index
    pub async fn analyze_current(&self, index: usize) -> Result<String> {
        let run = self.session.current().ok_or_else(|| anyhow!("No transcript has been processed yet"))?;
        let sentence = run
            .sentence(index)
            .ok_or_else(|| anyhow!("Sentence {} does not exist ({} sentences)", index, run.enriched.len()))?;
        self.analyze(&sentence.source_text).await
    }

    /// Analyze a sentence selected from a saved transcript
    pub async fn analyze_transcript(&self, transcript_path: &Path, target: AnalysisTarget) -> Result<String> {
        let sentence = match target {
            AnalysisTarget::Sentence(text) => text,
            AnalysisTarget::Index(index) => {
                let content = FileManager::read_to_string(transcript_path)?;
                let document: TranscriptDocument = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse transcript: {:?}", transcript_path))?;
                document
                    .sentence(index)
                    .map(|s| s.source_text.clone())
                    .ok_or_else(|| anyhow!("Sentence {} does not exist in {:?}", index, transcript_path))?
            }
        };

        self.analyze(&sentence).await
    }
}
