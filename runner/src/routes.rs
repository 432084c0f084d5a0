//! HTTP route handlers for the runner API

use crate::{AppError, AppResult, AppState, RunnerRequest, RunnerResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use tracing::{error, info};

pub const SUCCESS_MESSAGE: &str = "the binary file execution result";

/// POST /api/v1/runner - Run a script and return its standard output
///
/// Failures are classified and rendered with the matching HTTP status.
pub async fn run_binary(
    State(state): State<AppState>,
    payload: Result<Json<RunnerRequest>, JsonRejection>,
) -> AppResult<Json<RunnerResponse>> {
    let Json(payload) = payload.map_err(|rejection| {
        error!("Cannot parse request. {}", rejection.body_text());
        match rejection {
            JsonRejection::MissingJsonContentType(_) => AppError::UnsupportedMediaType,
            _ => AppError::Unparsable,
        }
    })?;

    info!("received request: {}", payload);

    let request = payload.validate().map_err(|errors| {
        for e in &errors {
            error!("{}", e);
        }
        AppError::Validation(errors)
    })?;

    let outcome = state.executor.execute(&request).await?;
    match outcome.into_result() {
        Ok(lines) => Ok(Json(RunnerResponse::new(SUCCESS_MESSAGE, lines))),
        Err(classification) => {
            error!(
                "exception has been occurred during running the binary file: {}",
                classification.message()
            );
            Err(AppError::Execution(classification))
        }
    }
}
