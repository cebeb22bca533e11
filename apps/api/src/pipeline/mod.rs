// Structured extraction and scoring pipeline.
// Three stages, each: fixed template → one text-generation call → strict schema validation.
// All generation calls go through the TextGenerator seam in llm_client.

pub mod analysis;
pub mod extraction;
pub mod handlers;
pub mod prompts;
pub mod schema;
pub mod scoring;

use serde::de::DeserializeOwned;
use tracing::{error, info};

use crate::config::GenerationSettings;
use crate::errors::PipelineError;
use crate::llm_client::prompts::{EVIDENCE_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::{strip_json_fences, Attachment, GenerationRequest, TextGenerator};
use crate::pipeline::prompts::PromptTemplate;
use crate::pipeline::schema::Validate;

/// Sends one instruction to the generator and validates the reply as `T`.
///
/// Schema failures are logged with full diagnostics and returned as
/// `PipelineError::SchemaValidation`. Nothing is retried or repaired here.
pub(crate) async fn run_stage<T>(
    generator: &dyn TextGenerator,
    settings: &GenerationSettings,
    template: &PromptTemplate,
    prompt: String,
    attachment: Option<Attachment>,
) -> Result<T, PipelineError>
where
    T: DeserializeOwned + Validate,
{
    let request = GenerationRequest {
        system: format!(
            "{} {} {}",
            template.system, JSON_ONLY_SYSTEM, EVIDENCE_INSTRUCTION
        ),
        prompt,
        attachment,
    };

    info!(
        "Running stage {} (template {}, model {})",
        template.name, template.version, settings.model
    );

    let raw = generator.generate(settings, &request).await.map_err(|e| {
        error!("Stage {} generation call failed: {e}", template.name);
        PipelineError::from(e)
    })?;

    decode::<T>(template.name, &raw)
}

/// Decodes raw model text into `T`, surfacing every failure as a schema violation.
pub(crate) fn decode<T>(stage: &'static str, raw: &str) -> Result<T, PipelineError>
where
    T: DeserializeOwned + Validate,
{
    let text = strip_json_fences(raw);

    let value: T = serde_json::from_str(text)
        .map_err(|e| schema_failure(stage, e.to_string(), raw))?;
    value
        .validate()
        .map_err(|diagnostics| schema_failure(stage, diagnostics, raw))?;

    Ok(value)
}

fn schema_failure(stage: &'static str, diagnostics: String, raw: &str) -> PipelineError {
    error!(
        stage,
        raw_response = raw,
        "Schema validation error: {diagnostics}"
    );
    PipelineError::SchemaValidation { stage, diagnostics }
}
