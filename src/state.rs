//! Application state
//!
//! Holds the outbound HTTP clients and the server configuration. The clients
//! are connection pools that are safe to share; nothing in here is mutated
//! after startup.

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::config::{ServerConfig, UpstreamConfig};
use crate::error::{RelayError, Result};

/// Shared application state
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,

    /// Client used to resolve redirects and talk to the analysis API.
    /// Follows redirects and enforces a total request deadline.
    pub resolve_client: Client,

    /// Client used to stream downloads. Does not follow redirects and has
    /// no total deadline; idleness is policed per chunk by the relay.
    pub stream_client: Client,
}

impl AppState {
    /// Build the state and its HTTP clients from configuration
    pub fn new(config: ServerConfig) -> Result<Self> {
        let resolve_client = base_client(&config.upstream)?
            .redirect(Policy::limited(config.upstream.max_redirects))
            .timeout(config.upstream.request_timeout())
            .build()
            .map_err(|e| RelayError::Config(format!("failed to build resolve client: {}", e)))?;

        let stream_client = base_client(&config.upstream)?
            .redirect(Policy::none())
            .build()
            .map_err(|e| RelayError::Config(format!("failed to build stream client: {}", e)))?;

        Ok(Self {
            config,
            resolve_client,
            stream_client,
        })
    }

    pub fn upstream(&self) -> &UpstreamConfig {
        &self.config.upstream
    }
}

fn base_client(upstream: &UpstreamConfig) -> Result<reqwest::ClientBuilder> {
    let user_agent = HeaderValue::from_str(&upstream.user_agent)
        .map_err(|e| RelayError::Config(format!("invalid user agent: {}", e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, user_agent);

    Ok(Client::builder()
        .default_headers(headers)
        .connect_timeout(upstream.connect_timeout()))
}
