use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::analysis::pipeline::PipelineFailure;
use crate::analysis::AnalysisFailed;
use crate::documents::DocumentError;
use crate::sessions::SessionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("{0}")]
    Analysis(#[from] AnalysisFailed),

    #[error("{0}")]
    Pipeline(Box<PipelineFailure>),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PipelineFailure> for AppError {
    fn from(failure: PipelineFailure) -> Self {
        AppError::Pipeline(Box::new(failure))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, error_body("NOT_FOUND", msg)),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                error_body("VALIDATION_ERROR", msg),
            ),
            AppError::Document(e) => (
                StatusCode::BAD_REQUEST,
                error_body("DOCUMENT_ERROR", &e.to_string()),
            ),
            AppError::Analysis(failure) => analysis_response(failure, None),
            AppError::Pipeline(failure) => {
                let partial = serde_json::to_value(&failure.partial).unwrap_or(Value::Null);
                analysis_response(&failure.error, Some(partial))
            }
            AppError::Session(SessionError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                error_body("NOT_FOUND", &format!("Session {id} not found")),
            ),
            AppError::Session(e) => {
                tracing::error!("Session error: {e}");
                (
                    StatusCode::CONFLICT,
                    error_body("SESSION_CONFLICT", &e.to_string()),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_body("INTERNAL_ERROR", "An internal server error occurred"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn error_body(code: &str, message: &str) -> Value {
    json!({
        "error": {
            "code": code,
            "message": message
        }
    })
}

/// Backend failures are transient ("try again"); bad model output is not.
fn analysis_response(failure: &AnalysisFailed, partial: Option<Value>) -> (StatusCode, Value) {
    tracing::error!(
        "Analysis failed at stage {}: {} (raw: {:?})",
        failure.stage,
        failure.source,
        failure.source.raw_output()
    );

    let (status, code, message) = if failure.source.is_transient() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "BACKEND_UNAVAILABLE",
            "The AI service is unavailable, please try again".to_string(),
        )
    } else {
        (
            StatusCode::BAD_GATEWAY,
            "ANALYSIS_FAILED",
            failure.source.to_string(),
        )
    };

    let mut body = json!({
        "error": {
            "code": code,
            "message": message,
            "stage": failure.stage
        }
    });
    if let Some(partial) = partial {
        body["error"]["partial"] = partial;
    }
    (status, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::pipeline::PartialRun;
    use crate::analysis::Stage;
    use crate::extraction::ExtractionError;
    use crate::llm_client::LlmError;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_backend_failure_maps_to_503_with_stage() {
        let err = AppError::Analysis(AnalysisFailed {
            stage: Stage::Synthesis,
            source: ExtractionError::Backend(LlmError::EmptyContent),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "BACKEND_UNAVAILABLE");
        assert_eq!(body["error"]["stage"], "synthesis");
    }

    #[tokio::test]
    async fn test_pipeline_failure_carries_partial_results() {
        let failure = PipelineFailure {
            error: AnalysisFailed {
                stage: Stage::Profile,
                source: ExtractionError::SchemaViolation {
                    raw: "{}".to_string(),
                    detail: "missing field `overall_score`".to_string(),
                },
            },
            partial: PartialRun {
                profile: Some(crate::analysis::fixtures::platform_profile()),
                ..PartialRun::default()
            },
        };
        let response = AppError::from(failure).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = body_json(response).await;
        assert_eq!(body["error"]["stage"], "profile");
        assert_eq!(body["error"]["partial"]["profile"]["title"], "Platform Engineer");
        assert!(body["error"]["partial"]["report"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_session_maps_to_404() {
        let response = AppError::from(SessionError::NotFound(uuid::Uuid::nil())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
