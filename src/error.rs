use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Main error type for the relay
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{}", error_chain(.0))]
    RemoteFetch(#[from] reqwest::Error),

    #[error("{}", error_chain(.0))]
    UpstreamConnect(reqwest::Error),

    #[error("upstream returned {0}")]
    UpstreamStatus(StatusCode),

    #[error("Could not extract video ID")]
    VideoIdNotFound { final_url: String },

    #[error("Third party API error")]
    AnalysisApi { status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] axum::http::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidInput(_) | RelayError::VideoIdNotFound { .. } => {
                StatusCode::BAD_REQUEST
            }
            RelayError::UpstreamConnect(_)
            | RelayError::UpstreamStatus(_)
            | RelayError::AnalysisApi { .. } => StatusCode::BAD_GATEWAY,
            RelayError::RemoteFetch(_)
            | RelayError::Http(_)
            | RelayError::Config(_)
            | RelayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            RelayError::VideoIdNotFound { final_url } => serde_json::json!({
                "detail": self.to_string(),
                "final_url": final_url,
            }),
            RelayError::AnalysisApi { status } => serde_json::json!({
                "detail": self.to_string(),
                "status": status,
            }),
            _ => serde_json::json!({ "detail": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Render an error together with its source chain.
///
/// `reqwest::Error` only displays its outermost layer ("error sending
/// request for url ..."); the useful part (connection refused, DNS,
/// certificate problems) lives further down the chain.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
