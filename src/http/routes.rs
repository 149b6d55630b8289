//! Axum router configuration

use axum::{
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::download::download_video;
use super::handlers::{analyze_video, expand_url, redirect_probe, root};

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // Any origin, method and header, with credentials. Credentials rule out
    // a literal `*`, so the layer mirrors the request instead.
    let cors = CorsLayer::very_permissive();

    Router::new()
        .route("/", get(root))
        .route("/api/expand", get(expand_url))
        .route("/api/redirect", get(redirect_probe))
        .route("/api/analysis", get(analyze_video))
        .route("/api/download", get(download_video))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Requests without an Origin get nothing to mirror.
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .with_state(state)
}
