//! HTTP request handlers
//!
//! Liveness, short link expansion and video analysis. The download proxy
//! lives in `download.rs`.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::analysis::{extract_video_id, fetch_video};
use crate::error::{RelayError, Result};
use crate::resolve::{parse_target, resolve, ResolveMethod};
use crate::state::AppState;

/// Query parameters shared by every `/api` route
#[derive(Debug, Deserialize)]
pub struct UrlParams {
    pub url: Option<String>,
}

/// Response of `/api/expand`
#[derive(Debug, Serialize)]
pub struct ExpandResponse {
    pub url: String,
    pub original_url: String,
    pub success: bool,
}

/// Response of `/api/redirect`
#[derive(Debug, Serialize)]
pub struct RedirectResponse {
    pub url: String,
    pub success: bool,
    pub method: ResolveMethod,
}

/// Liveness endpoint
/// GET /
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Douyin Downloader API is running" }))
}

/// Expand a short link to its final destination
/// GET /api/expand?url=
pub async fn expand_url(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UrlParams>,
) -> Result<Json<ExpandResponse>> {
    let target = parse_target(params.url.as_deref())?;

    let resolution = resolve(&state.resolve_client, &target)
        .await
        .inspect_err(|e| warn!("Failed to expand {}: {}", target, e))?;
    info!("Expanded {} to {}", target, resolution.final_url());

    Ok(Json(ExpandResponse {
        url: resolution.final_url().to_string(),
        original_url: params.url.unwrap_or_default(),
        success: true,
    }))
}

/// Expand a short link and report which probe produced the result
/// GET /api/redirect?url=
pub async fn redirect_probe(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UrlParams>,
) -> Result<Json<RedirectResponse>> {
    let target = parse_target(params.url.as_deref())?;

    let resolution = resolve(&state.resolve_client, &target)
        .await
        .inspect_err(|e| warn!("Failed to resolve {}: {}", target, e))?;

    Ok(Json(RedirectResponse {
        url: resolution.final_url().to_string(),
        success: true,
        method: resolution.method(),
    }))
}

/// Resolve a share link, extract the video id and return its metadata
/// GET /api/analysis?url=
pub async fn analyze_video(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UrlParams>,
) -> Result<Json<serde_json::Value>> {
    let target = parse_target(params.url.as_deref())?;

    let resolution = resolve(&state.resolve_client, &target)
        .await
        .inspect_err(|e| warn!("Failed to resolve {}: {}", target, e))?;
    let final_url = resolution.best_effort_url();

    let aweme_id = extract_video_id(final_url).ok_or_else(|| RelayError::VideoIdNotFound {
        final_url: final_url.to_string(),
    })?;
    info!("Analyzing aweme_id={} from {}", aweme_id, target);

    let data = fetch_video(
        &state.resolve_client,
        &state.config.analysis.api_url,
        &aweme_id,
    )
    .await?;

    Ok(Json(data))
}
