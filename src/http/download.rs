//! Video download proxy
//!
//! GET /api/download?url=<direct video url>

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use std::sync::Arc;
use tracing::{info, warn};

use super::handlers::UrlParams;
use super::stream::relay_body;
use crate::error::{RelayError, Result};
use crate::resolve::parse_target;
use crate::state::AppState;

pub const CONTENT_DISPOSITION: &str = "attachment; filename=video.mp4";

/// Stream a remote video back to the caller as an attachment
pub async fn download_video(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UrlParams>,
) -> Result<Response> {
    let target = parse_target(params.url.as_deref())?;
    info!("Proxying download of {}", target);

    let mut request = state.stream_client.get(target.clone());
    if let Some(referer) = &state.upstream().referer {
        request = request.header(header::REFERER, referer);
    }

    let upstream = request.send().await.map_err(|e| {
        warn!("Download of {} failed to connect: {}", target, e);
        RelayError::UpstreamConnect(e)
    })?;

    let status = upstream.status();
    if !status.is_success() {
        warn!("Download of {} rejected upstream: {}", target, status);
        return Err(RelayError::UpstreamStatus(status));
    }

    let content_length = upstream.content_length();
    let upstream_config = state.upstream();
    let body: Body = relay_body(
        upstream,
        upstream_config.stream_buffer_chunks,
        upstream_config.stream_idle_timeout(),
    );

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, HeaderValue::from_static("video/mp4"))
        .header(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static(CONTENT_DISPOSITION),
        );
    if let Some(len) = content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }

    Ok(builder.body(body)?)
}
