use crate::analysis::AnalysisEngine;
use crate::config::Config;
use crate::error::ServiceError;
use crate::model::{AnalysisResult, AnalyzeRequest, ErrorResponse, UploadResponse};
use crate::upload::UploadService;
use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AnalysisEngine>,
    pub uploads: Arc<UploadService>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::InvalidMediaType { .. } => StatusCode::BAD_REQUEST,
            ServiceError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Storage { .. } | ServiceError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if self.is_client_error() {
            warn!(status = %status, error = %self, "Request rejected");
        } else {
            error!(status = %status, error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: self.category().to_string(),
            detail: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Create the API router
pub fn create_router(state: AppState, config: &Config) -> Router {
    let cors = if config.api.cors_enabled {
        if config.api.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .api
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    } else {
        CorsLayer::new()
    };

    // The transport limit sits above the configured upload ceiling so
    // the upload service's own size check produces the structured 413.
    let body_limit = config.upload.max_upload_bytes.saturating_mul(2);

    Router::new()
        .route("/health", get(health_check))
        .route("/upload", post(upload_image))
        .route("/analyze", post(analyze_image))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy"
    }))
}

/// Upload an image file (multipart, `file` part)
#[instrument(skip(state, multipart))]
async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ServiceError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| anyhow::Error::from(e).context("read multipart field"))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let media_type = field.content_type().unwrap_or_default().to_string();
        let content = field
            .bytes()
            .await
            .map_err(|e| anyhow::Error::from(e).context("read uploaded file body"))?;

        let image_id = state.uploads.process_upload(&media_type, &content).await?;
        return Ok((StatusCode::CREATED, Json(UploadResponse { image_id })));
    }

    Err(ServiceError::InvalidMediaType {
        media_type: "missing `file` part".to_string(),
    })
}

/// Analyze an uploaded image
///
/// Idempotent: repeated calls with the same image_id return the same
/// result.
#[instrument(skip(state))]
async fn analyze_image(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResult>, ServiceError> {
    let result = state.engine.analyze(&request.image_id).await?;
    Ok(Json(result))
}

/// Start the API server
pub async fn start_api_server(state: AppState, config: &Config) -> Result<()> {
    let router = create_router(state, config);
    let addr = format!("{}:{}", config.api.host, config.api.port);

    info!(address = %addr, "Starting analysis API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, router)
        .await
        .context("API server error")?;

    Ok(())
}
