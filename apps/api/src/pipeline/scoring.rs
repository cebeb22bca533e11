//! Scoring stage — (`CvAnalysis`, `JobRequirements`) to `MatchingScore`.
//!
//! A pure function of its two inputs apart from model non-determinism:
//! both records are serialized deterministically into the instruction.

use std::sync::Arc;

use tracing::info;

use crate::config::GenerationSettings;
use crate::errors::PipelineError;
use crate::llm_client::TextGenerator;
use crate::pipeline::prompts::{render, MATCH_SCORING};
use crate::pipeline::run_stage;
use crate::pipeline::schema::{CvAnalysis, JobRequirements, MatchingScore};

#[derive(Clone)]
pub struct MatchScorer {
    generator: Arc<dyn TextGenerator>,
    settings: GenerationSettings,
}

impl MatchScorer {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: GenerationSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    pub async fn score(
        &self,
        cv_analysis: &CvAnalysis,
        job_requirements: &JobRequirements,
    ) -> Result<MatchingScore, PipelineError> {
        let prompt = build_prompt(cv_analysis, job_requirements)?;

        let score: MatchingScore = run_stage(
            self.generator.as_ref(),
            &self.settings,
            &MATCH_SCORING,
            prompt,
            None,
        )
        .await?;

        info!(
            "Match scored: overall={} skills={} experience={} ({} missing requirements)",
            score.overall_score,
            score.skills_match,
            score.experience_match,
            score.missing_requirements.len()
        );
        Ok(score)
    }
}

fn build_prompt(
    cv_analysis: &CvAnalysis,
    job_requirements: &JobRequirements,
) -> Result<String, PipelineError> {
    let cv_json = to_prompt_json("cv_analysis", cv_analysis)?;
    let job_json = to_prompt_json("job_requirements", job_requirements)?;

    Ok(render(
        &MATCH_SCORING,
        &[
            ("cv_analysis", cv_json.as_str()),
            ("job_requirements", job_json.as_str()),
        ],
    ))
}

fn to_prompt_json<T: serde::Serialize>(field: &str, value: &T) -> Result<String, PipelineError> {
    serde_json::to_string_pretty(value).map_err(|e| PipelineError::SchemaValidation {
        stage: MATCH_SCORING.name,
        diagnostics: format!("`{field}` could not be serialized: {e}"),
    })
}
