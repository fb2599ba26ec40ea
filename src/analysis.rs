/*!
 * On-demand sentence analysis.
 *
 * A learner picks one sentence of the transcript and asks for a breakdown:
 * a vocabulary table, grammar points with examples and an overall reading
 * of the sentence, written in the display language. The query does not
 * depend on, or touch, the current pipeline run.
 */

use log::{debug, error};
use std::sync::Arc;

use crate::errors::PipelineError;
use crate::language_utils::DisplayLanguage;
use crate::prompts;
use crate::service::ChatCompletion;

/// Answers analysis queries for single sentences
pub struct Analyzer {
    client: Arc<dyn ChatCompletion>,
}

impl Analyzer {
    pub fn new(client: Arc<dyn ChatCompletion>) -> Self {
        Self { client }
    }

    /// Analyze `sentence`, answering in `language`
    pub async fn analyze(&self, sentence: &str, language: DisplayLanguage) -> Result<String, PipelineError> {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            return Err(PipelineError::AnalysisFailure("sentence is empty".to_string()));
        }

        debug!("Analyzing sentence in {}: {}", language.code(), sentence);
        let prompt = prompts::analysis_prompt(sentence, language);

        let analysis = self
            .client
            .complete(&prompt.system, &prompt.user)
            .await
            .map_err(|e| {
                error!("Analysis request failed: {}", e);
                PipelineError::AnalysisFailure(e.to_string())
            })?;

        let analysis = analysis.trim();
        if analysis.is_empty() {
            return Err(PipelineError::AnalysisFailure("empty analysis response".to_string()));
        }

        Ok(analysis.to_string())
    }
}
