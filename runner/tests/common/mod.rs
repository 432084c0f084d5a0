#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use binary_runner::{create_app, AppState, RunnerResponse};
use capsules_binary_exec::{
    strategy_for, BinaryExecutor, OsFamily, PathResolver, ProcessSupervisor,
};
use std::time::Duration;
use tower::ServiceExt;

pub fn app_with_timeout(timeout: Duration) -> Router {
    let executor = BinaryExecutor::new(
        strategy_for(OsFamily::detect()),
        PathResolver::with_fallback_dirs(vec![]),
        ProcessSupervisor::new(timeout),
    );
    create_app(AppState::with_executor(executor))
}

pub async fn post_runner(app: Router, body: impl Into<String>) -> (StatusCode, RunnerResponse) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/runner")
                .header("content-type", "application/json")
                .body(Body::from(body.into()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: RunnerResponse = serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "response body is not a RunnerResponse ({e}): {}",
            String::from_utf8_lossy(&bytes)
        )
    });
    (status, parsed)
}

pub fn request_body(binary_file: &str, arguments: &[&str]) -> String {
    serde_json::json!({
        "binaryFile": binary_file,
        "arguments": arguments,
    })
    .to_string()
}
