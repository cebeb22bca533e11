use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::store::StoreError;

/// Failures a pipeline stage can report. Closed set: callers branch on the variant.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Schema validation failed in {stage}: {diagnostics}")]
    SchemaValidation {
        stage: &'static str,
        diagnostics: String,
    },

    #[error("Text generation service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Analysis store error: {0}")]
    Store(#[from] StoreError),
}

impl From<LlmError> for PipelineError {
    fn from(e: LlmError) -> Self {
        PipelineError::ServiceUnavailable(e.to_string())
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Pipeline(PipelineError::SchemaValidation { .. }) => "SCHEMA_VALIDATION_ERROR",
            AppError::Pipeline(PipelineError::ServiceUnavailable(_)) => "SERVICE_UNAVAILABLE",
            AppError::Pipeline(PipelineError::NotFound(_)) => "NOT_FOUND",
            AppError::Pipeline(PipelineError::Store(_)) => "STORE_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            AppError::Pipeline(PipelineError::SchemaValidation { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            AppError::Pipeline(PipelineError::ServiceUnavailable(msg)) => {
                tracing::error!("Text generation error: {msg}");
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            AppError::Pipeline(PipelineError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, msg.clone())
            }
            AppError::Pipeline(PipelineError::Store(e)) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An analysis storage error occurred".to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_validation_maps_to_unprocessable() {
        let err = AppError::from(PipelineError::SchemaValidation {
            stage: "extraction",
            diagnostics: "missing field `experience`".to_string(),
        });
        assert_eq!(err.code(), "SCHEMA_VALIDATION_ERROR");
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = AppError::from(PipelineError::NotFound("no analysis".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_llm_error_becomes_service_unavailable() {
        let err: PipelineError = LlmError::EmptyContent.into();
        assert!(matches!(err, PipelineError::ServiceUnavailable(_)));
        assert_eq!(
            AppError::from(err).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_store_failure_is_internal_without_details() {
        let err = AppError::from(PipelineError::from(StoreError::from(
            serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        )));
        assert_eq!(err.code(), "STORE_ERROR");
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err = AppError::Validation("vacancy_text cannot be empty".to_string());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
