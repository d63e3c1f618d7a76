use crate::analysis::AnalysisResponse;
use crate::error::AnalyzerError;
use crate::pipeline::AnalysisPipeline;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<AnalysisPipeline>,
    start_time: DateTime<Utc>,
}

impl AppState {
    /// Wraps a pipeline built at startup
    pub fn new(pipeline: AnalysisPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            start_time: Utc::now(),
        }
    }
}

/// Request payload for an analysis
///
/// Clients send the URL as `repo` or as `repo_url` (`repoUrl` is accepted too);
/// when several are present `repo` wins.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Repository URL
    #[serde(default)]
    pub repo: Option<String>,
    /// Alternate key for the repository URL
    #[serde(default, alias = "repoUrl")]
    pub repo_url: Option<String>,
}

impl AnalyzeRequest {
    /// Reads the request from a decoded JSON object
    ///
    /// Only objects are accepted; arrays and scalars never reach here.
    pub fn from_object(body: Map<String, Value>) -> crate::error::Result<Self> {
        serde_json::from_value(Value::Object(body)).map_err(|e| {
            AnalyzerError::InvalidInput(format!("Invalid request body: {}", e))
        })
    }

    /// The first non-blank repository URL in the payload
    pub fn repository(&self) -> Option<&str> {
        [self.repo.as_deref(), self.repo_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Current status
    pub status: String,
    /// Current timestamp
    pub timestamp: DateTime<Utc>,
    /// Service uptime in seconds
    pub uptime: u64,
    /// Acquisition strategy in use
    pub strategy: String,
    /// Completion provider in use
    pub provider: String,
}

/// The single point where failures become HTTP responses
///
/// Every error leaves as `{"error": "<message>"}` with the status from
/// [`AnalyzerError::status_code`]; internal detail only reaches the log.
#[derive(Debug)]
pub struct ApiError(pub AnalyzerError);

impl From<AnalyzerError> for ApiError {
    fn from(error: AnalyzerError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(status = status.as_u16(), "Request failed: {}", self.0);
        } else {
            warn!(status = status.as_u16(), "Request rejected: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.public_message() }))).into_response()
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        .route(
            "/api/analyze",
            post(analyze_repository).fallback(method_not_allowed),
        )
        .route("/api/diagnostics/llm", get(check_llm))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Analyze a repository endpoint
async fn analyze_repository(
    State(state): State<AppState>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        AnalyzerError::InvalidInput(format!("Invalid request body: {}", rejection.body_text()))
    })?;
    let request = AnalyzeRequest::from_object(body)?;

    let repo_url = request.repository().ok_or_else(|| {
        AnalyzerError::InvalidInput("Missing repository URL (expected 'repo' or 'repo_url')".into())
    })?;

    info!("Analysis requested for repository: {}", repo_url);
    let response = state.pipeline.analyze(repo_url).await?;
    Ok(Json(response))
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "repomentor".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        uptime: (Utc::now() - state.start_time).num_seconds().max(0) as u64,
        strategy: state.pipeline.strategy().to_string(),
        provider: state.pipeline.provider().to_string(),
    })
}

/// LLM connectivity check endpoint
async fn check_llm(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let reply = state.pipeline.check_completion_backend().await?;
    Ok(Json(json!({
        "status": "working",
        "provider": state.pipeline.provider(),
        "response": reply,
    })))
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_key_wins() {
        let request: AnalyzeRequest = serde_json::from_str(
            r#"{"repo": "https://github.com/a/b", "repo_url": "https://github.com/c/d"}"#,
        )
        .unwrap();
        assert_eq!(request.repository(), Some("https://github.com/a/b"));
    }

    #[test]
    fn test_alternate_keys() {
        let request: AnalyzeRequest =
            serde_json::from_str(r#"{"repo_url": "https://github.com/c/d"}"#).unwrap();
        assert_eq!(request.repository(), Some("https://github.com/c/d"));

        let request: AnalyzeRequest =
            serde_json::from_str(r#"{"repoUrl": "https://github.com/e/f"}"#).unwrap();
        assert_eq!(request.repository(), Some("https://github.com/e/f"));
    }

    #[test]
    fn test_blank_repo_falls_through() {
        let request: AnalyzeRequest =
            serde_json::from_str(r#"{"repo": "  ", "repo_url": "https://github.com/c/d"}"#).unwrap();
        assert_eq!(request.repository(), Some("https://github.com/c/d"));

        let request: AnalyzeRequest = serde_json::from_str(r#"{"repo": ""}"#).unwrap();
        assert_eq!(request.repository(), None);
    }

    #[test]
    fn test_from_object_rejects_wrong_types() {
        let body: Map<String, Value> =
            serde_json::from_str(r#"{"repo": ["https://github.com/a/b"]}"#).unwrap();
        assert!(matches!(
            AnalyzeRequest::from_object(body),
            Err(AnalyzerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_api_error_status() {
        let response = ApiError(AnalyzerError::Timeout("clone".into())).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

        let response = ApiError(AnalyzerError::NotFound("Repository not found".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
