/*!
 * Integration tests for on-demand sentence analysis
 */

use std::sync::Arc;

use yomikaki::analysis::Analyzer;
use yomikaki::app_controller::{AnalysisTarget, Controller};
use yomikaki::errors::PipelineError;
use yomikaki::language_utils::DisplayLanguage;
use yomikaki::providers::mock::MockProvider;

use crate::common;
use crate::common::mock_providers::{classroom_provider, request_kind, RequestKind, StaticTranscriber};

async fn processed_controller(provider: MockProvider) -> (tempfile::TempDir, Controller) {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_audio(temp_dir.path(), "lesson.mp3").unwrap();
    let segments = common::segments(&[("私は", 0.0, 1.0), ("学生です", 1.0, 2.0), ("元気です", 2.0, 3.0)]);
    let controller = Controller::with_services(common::test_config(), Arc::new(provider), StaticTranscriber::new(segments));
    controller
        .run(input, temp_dir.path().to_path_buf(), false)
        .await
        .unwrap();
    (temp_dir, controller)
}

/// Analysis of a run sentence sends that sentence and leaves the run untouched
#[tokio::test]
async fn test_analyzeCurrent_shouldAnalyzeSelectedSentence() {
    let provider = classroom_provider("私は学生です\n元気です");
    let (_temp_dir, controller) = processed_controller(provider.clone()).await;
    let run_before = controller.session().current().unwrap();

    let analysis = controller.analyze_current(2).await.unwrap();

    assert!(analysis.starts_with("| 語"));
    let last = provider.requests().pop().unwrap();
    assert_eq!(request_kind(&last), RequestKind::Analysis);
    assert!(last.user.contains("元気です"));

    let run_after = controller.session().current().unwrap();
    assert!(Arc::ptr_eq(&run_before, &run_after));
}

#[tokio::test]
async fn test_analyzeCurrent_withUnknownIndex_shouldFail() {
    let (_temp_dir, controller) = processed_controller(classroom_provider("私は学生です\n元気です")).await;
    assert!(controller.analyze_current(0).await.is_err());
    assert!(controller.analyze_current(3).await.is_err());
}

#[tokio::test]
async fn test_analyzeCurrent_withoutRun_shouldFail() {
    let controller = Controller::with_services(
        common::test_config(),
        Arc::new(classroom_provider("")),
        StaticTranscriber::new(Vec::new()),
    );
    assert!(controller.analyze_current(1).await.is_err());
}

/// A saved transcript can be queried by sentence number
#[tokio::test]
async fn test_analyzeTranscript_withIndex_shouldReadSavedSentence() {
    let provider = classroom_provider("私は学生です\n元気です");
    let (temp_dir, controller) = processed_controller(provider.clone()).await;
    let transcript = temp_dir.path().join("lesson.transcript.json");

    controller
        .analyze_transcript(&transcript, AnalysisTarget::Index(1))
        .await
        .unwrap();
    let last = provider.requests().pop().unwrap();
    assert!(last.user.contains("私は学生です"));

    assert!(controller
        .analyze_transcript(&transcript, AnalysisTarget::Index(9))
        .await
        .is_err());
}

/// Free text needs no transcript at all
#[tokio::test]
async fn test_analyzeTranscript_withSentence_shouldSkipTranscript() {
    let provider = classroom_provider("");
    let controller = Controller::with_services(
        common::test_config(),
        Arc::new(provider.clone()),
        StaticTranscriber::new(Vec::new()),
    );

    let result = controller
        .analyze_transcript(std::path::Path::new("/nonexistent.json"), AnalysisTarget::Sentence("猫が好きです".to_string()))
        .await;

    assert!(result.is_ok());
    assert_eq!(provider.request_count(), 1);
}

/// The analysis prompt follows the requested display language
#[tokio::test]
async fn test_analyze_withEachLanguage_shouldUseLocalizedPrompt() {
    let provider = MockProvider::scripted(|_| Ok("analysis".to_string()));
    let analyzer = Analyzer::new(Arc::new(provider.clone()));

    for language in DisplayLanguage::ALL {
        analyzer.analyze("猫が好きです", language).await.unwrap();
    }

    let systems: Vec<String> = provider.requests().into_iter().map(|r| r.system).collect();
    assert_eq!(systems.len(), 3);
    assert_ne!(systems[0], systems[1]);
    assert_ne!(systems[1], systems[2]);
}

#[tokio::test]
async fn test_analyze_withEmptyResponse_shouldReturnAnalysisFailure() {
    let analyzer = Analyzer::new(Arc::new(MockProvider::scripted(|_| Ok("   ".to_string()))));
    let result = analyzer.analyze("猫が好きです", DisplayLanguage::English).await;
    assert!(matches!(result, Err(PipelineError::AnalysisFailure(_))));
}
