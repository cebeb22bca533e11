//! Extraction stage — vacancy text to `JobRequirements`.

use std::sync::Arc;

use tracing::info;

use crate::config::GenerationSettings;
use crate::errors::PipelineError;
use crate::llm_client::TextGenerator;
use crate::pipeline::prompts::{render, JOB_REQUIREMENTS};
use crate::pipeline::run_stage;
use crate::pipeline::schema::JobRequirements;

#[derive(Clone)]
pub struct RequirementsExtractor {
    generator: Arc<dyn TextGenerator>,
    settings: GenerationSettings,
}

impl RequirementsExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: GenerationSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    /// Extracts structured requirements from a job vacancy.
    pub async fn extract(&self, vacancy_text: &str) -> Result<JobRequirements, PipelineError> {
        let prompt = render(&JOB_REQUIREMENTS, &[("vacancy_text", vacancy_text)]);
        let requirements: JobRequirements = run_stage(
            self.generator.as_ref(),
            &self.settings,
            &JOB_REQUIREMENTS,
            prompt,
            None,
        )
        .await?;

        info!(
            "Extracted {} skills, seniority={:?}",
            requirements.skills.len(),
            requirements.seniority_level
        );
        Ok(requirements)
    }
}
