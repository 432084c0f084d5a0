//! Binary Runner Service
//!
//! Exposes the binary execution capsule over HTTP.

pub mod config;
pub mod models;
pub mod routes;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use capsules_binary_exec::{BinaryExecutor, Classification, ExecError, StatusCategory};
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info};

pub use config::Config;
pub use models::{RunnerRequest, RunnerResponse};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<BinaryExecutor>,
}

impl AppState {
    /// Create application state with an executor for the host OS
    pub fn new(config: &Config) -> Self {
        let executor = BinaryExecutor::for_host(config.process_timeout());
        info!(
            os = %executor.family(),
            timeout_ms = config.process_timeout_ms,
            "initialized binary runner application state"
        );
        Self::with_executor(executor)
    }

    pub fn with_executor(executor: BinaryExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }
}

/// Errors rendered to API callers as a `RunnerResponse`
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<String>),
    #[error("not parsable request")]
    Unparsable,
    #[error("unsupported media type")]
    UnsupportedMediaType,
    #[error("error during running the binary file: {0}")]
    Execution(Classification),
    #[error("Internal server error")]
    Internal,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Unparsable => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Execution(classification) => status_for(classification.status()),
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response_body(&self) -> RunnerResponse {
        match self {
            AppError::Validation(errors) => RunnerResponse::new("Validation failed", errors.clone()),
            AppError::Unparsable => RunnerResponse::new(
                "not parsable request",
                vec!["please double check the json object".to_string()],
            ),
            AppError::UnsupportedMediaType => RunnerResponse::new(
                "not parsable request",
                vec!["Content-Type should be application/json".to_string()],
            ),
            AppError::Execution(classification) => RunnerResponse::new(
                "error during running the binary file",
                vec![classification.message().to_string()],
            ),
            AppError::Internal => RunnerResponse::new(
                "Internal server error",
                vec!["please contact the admin".to_string()],
            ),
        }
    }
}

impl From<ExecError> for AppError {
    fn from(err: ExecError) -> Self {
        error!(error = %err, "binary file could not be executed");
        AppError::Execution(err.classification())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response_body())).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// HTTP status for a classification's severity
pub fn status_for(category: StatusCategory) -> StatusCode {
    match category {
        StatusCategory::Ok => StatusCode::OK,
        StatusCategory::BadRequest => StatusCode::BAD_REQUEST,
        StatusCategory::Forbidden => StatusCode::FORBIDDEN,
        StatusCategory::NotFound => StatusCode::NOT_FOUND,
        StatusCategory::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
        StatusCategory::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(detail, "handler panicked");
    AppError::Internal.into_response()
}

/// Health check endpoint
async fn healthz() -> impl IntoResponse {
    "OK"
}

/// Create the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/v1/runner", post(routes::run_binary))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_classification_has_a_status() {
        for classification in Classification::ALL {
            let status = status_for(classification.status());
            if classification.is_success() {
                assert_eq!(status, StatusCode::OK);
            } else {
                assert!(status.is_client_error() || status.is_server_error());
            }
        }
    }

    #[test]
    fn execution_errors_use_classification_table() {
        let err = AppError::Execution(Classification::TimeoutReached);
        assert_eq!(err.status_code(), StatusCode::REQUEST_TIMEOUT);
        let body = err.to_response_body();
        assert_eq!(body.message, "error during running the binary file");
        assert_eq!(
            body.details,
            vec!["command execution reached the defined timeout and execution has been stopped"]
        );
    }

    #[test]
    fn exec_error_converts_to_not_found() {
        let err: AppError = ExecError::FileNotFound {
            reference: "wrong/path/ls.sh".into(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_response_body().details, vec!["execution file not found"]);
    }

    #[test]
    fn internal_error_hides_details() {
        let body = AppError::Internal.to_response_body();
        assert_eq!(body.message, "Internal server error");
        assert_eq!(body.details, vec!["please contact the admin"]);
        assert_eq!(
            AppError::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn missing_content_type_is_unsupported_media_type() {
        let err = AppError::UnsupportedMediaType;
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body = err.to_response_body();
        assert_eq!(body.message, "not parsable request");
        assert_eq!(body.details, vec!["Content-Type should be application/json"]);
    }

    #[test]
    fn permission_denied_is_forbidden() {
        let err: AppError = ExecError::NotExecutable {
            path: "/opt/protected.sh".into(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
