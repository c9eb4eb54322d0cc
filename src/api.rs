//! HTTP surface: health, analysis and region-code search

use crate::analysis::pipeline::{Analyzer, HouseholdProfile};
use crate::analysis::rank::RankedResult;
use crate::analysis::regions::RegionResolver;
use crate::error::AnalysisError;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

#[derive(Serialize, Deserialize)]
pub struct ApiResponse {
    pub message: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub count: usize,
    pub results: Vec<RankedResult>,
}

#[derive(Deserialize)]
pub struct RegionQuery {
    pub region: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct RegionCodeResponse {
    pub region: String,
    pub lawd_code: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/api/health", get(health_check))
        .route("/api/analyze", post(analyze))
        .route("/api/property/search", get(search_region))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let status = match self {
            AnalysisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AnalysisError::RegionNotFound(_) => StatusCode::NOT_FOUND,
            ref e if e.is_empty_result() => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.kind(), "message": self.to_string() }));
        (status, body).into_response()
    }
}

async fn health_check() -> Json<ApiResponse> {
    Json(ApiResponse {
        message: "Apartment investment API is running".to_string(),
        status: "ok".to_string(),
    })
}

async fn analyze(
    State(state): State<AppState>,
    Json(profile): Json<HouseholdProfile>,
) -> Result<Json<AnalyzeResponse>, AnalysisError> {
    info!(
        "Analyze request: budget={} workplace={} spouse={:?}",
        profile.budget, profile.workplace, profile.spouse_workplace
    );

    let today = Local::now().date_naive();
    let results = state.analyzer.analyze(&profile, today).await.map_err(|e| {
        warn!("Analysis failed: {}", e);
        e
    })?;

    Ok(Json(AnalyzeResponse {
        count: results.len(),
        results,
    }))
}

async fn search_region(
    State(state): State<AppState>,
    Query(query): Query<RegionQuery>,
) -> Result<Json<RegionCodeResponse>, AnalysisError> {
    let region = query
        .region
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AnalysisError::InvalidInput("region is required".to_string()))?;

    let code = RegionResolver::new(state.analyzer.catalog()).region_code(&region)?;
    Ok(Json(RegionCodeResponse {
        region,
        lawd_code: code.to_string(),
    }))
}
