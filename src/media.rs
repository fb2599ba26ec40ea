use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;

use crate::errors::PipelineError;

// @module: Media detection and audio extraction

// @const: Audio formats uploaded as-is
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "flac", "ogg", "aac"];

// @const: Video formats whose audio track is extracted first
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm", "avi", "m4v"];

/// Default limit for one ffmpeg extraction
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(300);

/// Kind of input media
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Classify a file extension (case-insensitive)
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.to_lowercase();
        if AUDIO_EXTENSIONS.contains(&extension.as_str()) {
            Some(Self::Audio)
        } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            Some(Self::Video)
        } else {
            None
        }
    }

    /// Classify an existing media file by its extension
    pub fn detect<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PipelineError::MediaExtraction(format!("File does not exist: {:?}", path)));
        }

        path.extension()
            .and_then(|ext| Self::from_extension(&ext.to_string_lossy()))
            .ok_or_else(|| PipelineError::MediaExtraction(format!("Unsupported media format: {:?}", path)))
    }
}

/// Audio ready for upload
///
/// Holds the temporary directory of extracted audio, which is removed on drop.
#[derive(Debug)]
pub struct PreparedAudio {
    path: PathBuf,
    temp_dir: Option<TempDir>,
}

impl PreparedAudio {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the audio was extracted from a video
    pub fn is_extracted(&self) -> bool {
        self.temp_dir.is_some()
    }
}

/// Prepares input media for transcription
#[derive(Debug, Clone)]
pub struct MediaProcessor {
    timeout: Duration,
}

impl Default for MediaProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_EXTRACTION_TIMEOUT)
    }
}

impl MediaProcessor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Return an audio file for `input`, extracting the audio track of videos
    pub async fn prepare_audio(&self, input: &Path) -> Result<PreparedAudio, PipelineError> {
        match MediaKind::detect(input)? {
            MediaKind::Audio => Ok(PreparedAudio {
                path: input.to_path_buf(),
                temp_dir: None,
            }),
            MediaKind::Video => {
                let temp_dir = TempDir::new()
                    .map_err(|e| PipelineError::MediaExtraction(format!("Failed to create temp dir: {}", e)))?;
                let output = temp_dir.path().join("audio.mp3");
                self.extract_audio(input, &output).await?;
                Ok(PreparedAudio {
                    path: output,
                    temp_dir: Some(temp_dir),
                })
            }
        }
    }

    /// Extract the audio track of `video` to an MP3 file
    pub async fn extract_audio(&self, video: &Path, output: &Path) -> Result<(), PipelineError> {
        info!("Extracting audio from {:?}", video);

        let ffmpeg_future = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(video)
            .args(["-vn", "-acodec", "libmp3lame", "-ar", "44100", "-b:a", "192k"])
            .arg(output)
            .kill_on_drop(true)
            .output();

        let result = tokio::select! {
            result = ffmpeg_future => {
                result.map_err(|e| PipelineError::MediaExtraction(format!("Failed to execute ffmpeg: {}", e)))?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(PipelineError::MediaExtraction(format!(
                    "ffmpeg timed out after {} seconds",
                    self.timeout.as_secs()
                )));
            }
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("Audio extraction failed: {}", filtered);
            return Err(PipelineError::MediaExtraction(filtered));
        }

        let size = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(PipelineError::MediaExtraction(format!(
                "No audio track could be extracted from {:?}",
                video
            )));
        }

        debug!("Extracted {} bytes of audio to {:?}", size, output);
        Ok(())
    }
}

/// Keep only the meaningful lines of ffmpeg stderr
///
/// Drops the version banner, build configuration and stream metadata.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "Stream mapping:",
        "Output #",
        "Press [q]",
        "size=",
        "encoder",
        "handler_name",
        "major_brand",
        "minor_version",
        "compatible_brands",
        "creation_time",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
