//! Axum route handlers for the matching pipeline.

use std::time::Duration;

use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::info;

use crate::errors::{AppError, PipelineError};
use crate::pipeline::schema::{CvAnalysis, JobRequirements, MatchingScore, Validate};
use crate::state::AppState;
use crate::store::DEFAULT_SESSION;

pub const SESSION_HEADER: &str = "x-session-id";
const MAX_SESSION_ID_LEN: usize = 128;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExtractRequirementsRequest {
    pub vacancy_text: String,
}

#[derive(Debug, Deserialize)]
pub struct ScoreMatchRequest {
    pub cv_analysis: CvAnalysis,
    pub job_requirements: JobRequirements,
}

/// A CV upload pulled out of the multipart body.
///
/// `content_type` is what the client declared; it is logged, never forwarded.
struct UploadedDocument {
    filename: String,
    content_type: String,
    data: Bytes,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/extract-requirements
pub async fn handle_extract_requirements(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequirementsRequest>,
) -> Result<Json<JobRequirements>, AppError> {
    if request.vacancy_text.trim().is_empty() {
        return Err(AppError::Validation(
            "vacancy_text cannot be empty".to_string(),
        ));
    }

    let requirements = state.extractor.extract(&request.vacancy_text).await?;
    Ok(Json(requirements))
}

/// POST /api/v1/analyze-document
///
/// Multipart upload with a `file` field. Bounded by the configured document timeout.
pub async fn handle_analyze_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<CvAnalysis>, AppError> {
    let session = session_id(&headers)?;
    let document = read_document(multipart).await?;

    info!(
        "Analyzing document '{}' ({} bytes, {}) for session {session}",
        document.filename,
        document.data.len(),
        document.content_type
    );

    let timeout = Duration::from_secs(state.config.document_timeout_secs);
    let analysis = tokio::time::timeout(timeout, state.analyzer.analyze(&session, document.data))
        .await
        .map_err(|_| {
            PipelineError::ServiceUnavailable(format!(
                "document analysis exceeded {}s",
                timeout.as_secs()
            ))
        })??;

    Ok(Json(analysis))
}

/// GET /api/v1/analysis-summary
///
/// Returns the most recent analysis for the caller's session.
pub async fn handle_analysis_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CvAnalysis>, AppError> {
    let session = session_id(&headers)?;

    let analysis = state.analyzer.latest(&session).await?.ok_or_else(|| {
        PipelineError::NotFound("No CV analysis found. Please upload a CV first.".to_string())
    })?;

    Ok(Json(analysis))
}

/// POST /api/v1/score-match
///
/// Both records must satisfy the same checks the stages apply to model output.
pub async fn handle_score_match(
    State(state): State<AppState>,
    Json(request): Json<ScoreMatchRequest>,
) -> Result<Json<MatchingScore>, AppError> {
    request
        .cv_analysis
        .validate()
        .map_err(|e| AppError::Validation(format!("Invalid cv_analysis: {e}")))?;
    request
        .job_requirements
        .validate()
        .map_err(|e| AppError::Validation(format!("Invalid job_requirements: {e}")))?;

    let score = state
        .scorer
        .score(&request.cv_analysis, &request.job_requirements)
        .await?;
    Ok(Json(score))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Reads the session from the `x-session-id` header, defaulting to the shared session.
fn session_id(headers: &HeaderMap) -> Result<String, AppError> {
    let Some(value) = headers.get(SESSION_HEADER) else {
        return Ok(DEFAULT_SESSION.to_string());
    };

    let session = value
        .to_str()
        .map_err(|_| AppError::Validation(format!("{SESSION_HEADER} must be valid ASCII")))?
        .trim();

    if session.is_empty() || session.len() > MAX_SESSION_ID_LEN {
        return Err(AppError::Validation(format!(
            "{SESSION_HEADER} must be between 1 and {MAX_SESSION_ID_LEN} characters"
        )));
    }
    Ok(session.to_string())
}

async fn read_document(mut multipart: Multipart) -> Result<UploadedDocument, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.pdf").to_string();
        let content_type = field.content_type().unwrap_or("unknown").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        if data.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        return Ok(UploadedDocument {
            filename,
            content_type,
            data,
        });
    }

    Err(AppError::Validation(
        "Multipart body must contain a 'file' field".to_string(),
    ))
}
