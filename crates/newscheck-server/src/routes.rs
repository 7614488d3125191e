//! HTTP handlers
//!
//! Thin adapter over [`Detector`]: validation and response shaping live here,
//! inference runs on the blocking pool.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use newscheck_classifiers::Detector;
use newscheck_core::{Error, ModelMetadata, PredictionResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Instant;
use tokio::task::JoinError;
use tracing::{debug, error, warn};

use crate::state::AppState;

/// Note attached to the static response served without a detector
pub const NO_MODEL_NOTE: &str = "No model loaded - using default response";

pub const API_VERSION: &str = "1.0.0";
pub const SERVICE_NAME: &str = "fake-news-detector";

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchPredictRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub model_loaded: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub service: &'static str,
}

pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    metrics::counter!("newscheck_requests_total", "endpoint" => "root").increment(1);
    Json(RootResponse {
        message: "Fake News Detection API",
        version: API_VERSION,
        status: "running",
        model_loaded: state.model_loaded(),
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    metrics::counter!("newscheck_requests_total", "endpoint" => "health").increment(1);
    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.model_loaded(),
        service: SERVICE_NAME,
    })
}

pub async fn model_info(State(state): State<AppState>) -> Json<ModelMetadata> {
    metrics::counter!("newscheck_requests_total", "endpoint" => "model_info").increment(1);
    let info = match &state.detector {
        Some(detector) => detector.model_info().clone(),
        None => ModelMetadata::no_model(),
    };
    Json(info)
}

pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    metrics::counter!("newscheck_requests_total", "endpoint" => "predict").increment(1);
    let Json(request) = payload?;

    if request.text.trim().is_empty() {
        return Err(AppError::InvalidRequest("Text cannot be empty".to_string()));
    }

    let Some(detector) = state.detector.clone() else {
        debug!("No detector, serving static response");
        let result = PredictionResult::default_result().with_note(NO_MODEL_NOTE);
        return Ok(Json(json!({ "success": true, "result": result })));
    };

    let outcome = tokio::task::spawn_blocking(move || classify(&detector, &request.text)).await;

    Ok(Json(match outcome {
        Ok(result) => json!({ "success": true, "result": result }),
        Err(e) => task_failure(e),
    }))
}

pub async fn batch_predict(
    State(state): State<AppState>,
    payload: Result<Json<BatchPredictRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    metrics::counter!("newscheck_requests_total", "endpoint" => "batch_predict").increment(1);
    let Json(request) = payload?;

    if request.texts.is_empty() {
        return Err(AppError::InvalidRequest("Text list cannot be empty".to_string()));
    }

    let Some(detector) = state.detector.clone() else {
        let results = vec![PredictionResult::default_result(); request.texts.len()];
        return Ok(Json(json!({ "success": true, "results": results })));
    };

    debug!(count = request.texts.len(), "Batch prediction");
    let outcome = tokio::task::spawn_blocking(move || {
        request
            .texts
            .iter()
            .map(|text| classify(&detector, text))
            .collect::<Vec<_>>()
    })
    .await;

    Ok(Json(match outcome {
        Ok(results) => json!({ "success": true, "results": results }),
        Err(e) => task_failure(e),
    }))
}

pub async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}

/// Predict one text, recording metrics. Inference failures yield the default result.
fn classify(detector: &Detector, text: &str) -> PredictionResult {
    let started = Instant::now();
    let result = detector.try_predict(text).unwrap_or_else(|e| {
        metrics::counter!("newscheck_inference_failures_total").increment(1);
        warn!(error = %e, "Inference failed, returning default result");
        PredictionResult::default_result()
    });

    metrics::histogram!("newscheck_prediction_latency_us")
        .record(started.elapsed().as_micros() as f64);
    metrics::counter!("newscheck_predictions_total", "class" => result.class.as_str())
        .increment(1);
    result
}

/// Body returned when the blocking inference task panics or is cancelled
fn task_failure(e: JoinError) -> Value {
    let err = Error::internal(e.to_string());
    error!(error = %err, "Prediction task failed");
    json!({ "success": false, "error": err.to_string() })
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Not found")]
    NotFound,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
        };

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_panicked_task_reports_failure() {
        let outcome = tokio::task::spawn_blocking(|| -> PredictionResult {
            panic!("classifier crashed");
        })
        .await;

        let body = task_failure(outcome.unwrap_err());
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("internal error:"));
        assert!(body.get("result").is_none());
        assert!(body.get("results").is_none());
    }

    #[test]
    fn test_app_error_status() {
        let response = AppError::InvalidRequest("Text cannot be empty".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
    }
}
