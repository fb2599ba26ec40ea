/*!
 * Integration tests for controller runs over files on disk
 */

use std::sync::Arc;

use yomikaki::app_controller::Controller;
use yomikaki::errors::ProviderError;
use yomikaki::file_utils::FileManager;
use yomikaki::providers::mock::MockProvider;
use yomikaki::subtitle::parse_vtt;
use yomikaki::transcript::TranscriptDocument;

use crate::common;
use crate::common::mock_providers::{classroom_provider, request_kind, RequestKind, StaticTranscriber};

fn controller_with(provider: MockProvider, transcriber: Arc<StaticTranscriber>) -> Controller {
    common::init_test_logging();
    Controller::with_services(common::test_config(), Arc::new(provider), transcriber)
}

/// A processed audio file produces the subtitle track and the transcript
#[tokio::test]
async fn test_run_withAudioFile_shouldWriteSubtitlesAndTranscript() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_audio(temp_dir.path(), "lesson.mp3").unwrap();
    let transcriber = StaticTranscriber::new(common::greeting_segments());
    let controller = controller_with(classroom_provider("こんにちは元気です"), transcriber.clone());

    let outputs = controller
        .run(input.clone(), temp_dir.path().to_path_buf(), false)
        .await
        .unwrap()
        .expect("file should be processed");

    assert_eq!(transcriber.last_audio(), Some(input.clone()));
    assert_eq!(outputs.subtitles, temp_dir.path().join("lesson.ja.vtt"));
    assert_eq!(outputs.transcript, temp_dir.path().join("lesson.transcript.json"));
    assert!(outputs.srt.is_none());

    let cues = parse_vtt(&FileManager::read_to_string(&outputs.subtitles).unwrap()).unwrap();
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].end, "00:00:02.500");
    assert_eq!(cues[0].translated_text(), Some("[zh] こんにちは元気です"));

    let document: TranscriptDocument =
        serde_json::from_str(&FileManager::read_to_string(&outputs.transcript).unwrap()).unwrap();
    assert_eq!(document.source.as_deref(), Some("lesson.mp3"));
    assert_eq!(document.sentences.len(), 1);

    let current = controller.session().current().expect("run should be installed");
    assert_eq!(current.id.to_string(), document.run_id);
}

/// Existing subtitles are kept unless overwriting is forced
#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_audio(temp_dir.path(), "lesson.wav").unwrap();
    let transcriber = StaticTranscriber::new(common::greeting_segments());
    let controller = controller_with(classroom_provider("こんにちは元気です"), transcriber.clone());
    let output_dir = temp_dir.path().to_path_buf();

    assert!(controller.run(input.clone(), output_dir.clone(), false).await.unwrap().is_some());
    let first_run = controller.session().current().unwrap().id;

    assert!(controller.run(input.clone(), output_dir.clone(), false).await.unwrap().is_none());
    assert_eq!(transcriber.calls(), 1);
    assert_eq!(controller.session().current().unwrap().id, first_run);

    assert!(controller.run(input, output_dir, true).await.unwrap().is_some());
    assert_eq!(transcriber.calls(), 2);
    assert_ne!(controller.session().current().unwrap().id, first_run);
}

/// The SRT copy is written when enabled
#[tokio::test]
async fn test_run_withWriteSrt_shouldWriteSrtCopy() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_audio(temp_dir.path(), "lesson.m4a").unwrap();
    let mut config = common::test_config();
    config.pipeline.write_srt = true;
    let controller = Controller::with_services(
        config,
        Arc::new(classroom_provider("こんにちは元気です")),
        StaticTranscriber::new(common::greeting_segments()),
    );

    let outputs = controller.run(input, temp_dir.path().join("out"), false).await.unwrap().unwrap();

    let srt_path = outputs.srt.expect("srt should be written");
    let srt = FileManager::read_to_string(&srt_path).unwrap();
    assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:02,500\n"));
}

/// A transcription failure aborts the run without writing anything
#[tokio::test]
async fn test_run_whenTranscriptionFails_shouldFailWithoutOutputs() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_audio(temp_dir.path(), "lesson.mp3").unwrap();
    let controller = controller_with(classroom_provider(""), StaticTranscriber::failing());

    let result = controller.run(input, temp_dir.path().to_path_buf(), false).await;

    assert!(result.is_err());
    assert!(!temp_dir.path().join("lesson.ja.vtt").exists());
    assert!(controller.session().current().is_none());
}

#[tokio::test]
async fn test_run_withUnsupportedOrMissingFile_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    let notes = common::create_test_file(temp_dir.path(), "notes.txt", b"hello").unwrap();
    let controller = controller_with(classroom_provider(""), StaticTranscriber::new(Vec::new()));

    assert!(controller.run(notes, temp_dir.path().to_path_buf(), false).await.is_err());
    assert!(controller
        .run(temp_dir.path().join("missing.mp3"), temp_dir.path().to_path_buf(), false)
        .await
        .is_err());
}

/// Failed enrichment calls are reported in the issues log
#[tokio::test]
async fn test_run_withTranslationFailures_shouldWriteIssuesLog() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_audio(temp_dir.path(), "lesson.mp3").unwrap();
    let provider = MockProvider::scripted(|request| match request_kind(request) {
        RequestKind::Merge => Ok("こんにちは元気です".to_string()),
        RequestKind::Translation(_) => Err(ProviderError::AuthenticationError("invalid key".to_string())),
        _ => Ok(request.user.clone()),
    });
    let controller = controller_with(provider, StaticTranscriber::new(common::greeting_segments()));

    let outputs = controller.run(input, temp_dir.path().to_path_buf(), false).await.unwrap().unwrap();

    let cues = parse_vtt(&FileManager::read_to_string(&outputs.subtitles).unwrap()).unwrap();
    assert_eq!(cues[0].lines, vec!["こんにちは元気です"]);

    let log = FileManager::read_to_string(temp_dir.path().join("yomikaki.issues.log")).unwrap();
    assert!(log.contains("1 failed enrichment calls"));
    assert!(log.contains("#1 こんにちは元気です: translation failed"));
}

/// Every media file of a folder is processed once, then skipped
#[tokio::test]
async fn test_runFolder_shouldProcessMediaFilesAndSkipDoneOnes() {
    let temp_dir = common::create_temp_dir().unwrap();
    let nested = temp_dir.path().join("week2");
    FileManager::ensure_dir(&nested).unwrap();
    common::create_test_audio(temp_dir.path(), "day1.mp3").unwrap();
    common::create_test_audio(&nested, "day2.flac").unwrap();
    common::create_test_file(temp_dir.path(), "readme.txt", b"notes").unwrap();

    let transcriber = StaticTranscriber::new(common::greeting_segments());
    let controller = controller_with(classroom_provider("こんにちは元気です"), transcriber.clone());

    let summary = controller.run_folder(temp_dir.path().to_path_buf(), false).await.unwrap();
    assert_eq!((summary.processed, summary.skipped, summary.failed), (2, 0, 0));
    assert!(nested.join("day2.ja.vtt").exists());
    assert!(temp_dir.path().join("day1.transcript.json").exists());

    let summary = controller.run_folder(temp_dir.path().to_path_buf(), false).await.unwrap();
    assert_eq!((summary.processed, summary.skipped, summary.failed), (0, 2, 0));
    assert_eq!(transcriber.calls(), 2);
}

#[tokio::test]
async fn test_runFolder_withoutMedia_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    common::create_test_file(temp_dir.path(), "readme.txt", b"notes").unwrap();
    let controller = controller_with(classroom_provider(""), StaticTranscriber::new(Vec::new()));

    assert!(controller.run_folder(temp_dir.path().to_path_buf(), false).await.is_err());
}
