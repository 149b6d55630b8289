//! Server configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Conventional desktop browser identity; some video CDNs refuse anything else.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Outbound request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// User-Agent sent on every outbound request
    pub user_agent: String,

    /// Referer sent when proxying downloads
    pub referer: Option<String>,

    /// TCP/TLS connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// Total deadline for resolution requests in seconds
    pub request_timeout_secs: u64,

    /// Maximum number of redirects followed while resolving
    pub max_redirects: usize,

    /// Maximum wait for the next body chunk while streaming, in seconds
    pub stream_idle_timeout_secs: u64,

    /// Number of chunks allowed in flight between upstream and caller
    pub stream_buffer_chunks: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            referer: Some("https://www.douyin.com/".to_string()),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            max_redirects: 10,
            stream_idle_timeout_secs: 60,
            stream_buffer_chunks: 8,
        }
    }
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_idle_timeout_secs)
    }
}

/// Video analysis API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Endpoint queried with `?aweme_id=<id>`
    pub api_url: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_url: "https://dapi.liyunfei.eu.org/api/douyin/web/fetch_one_video".to_string(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Outbound request configuration
    pub upstream: UpstreamConfig,

    /// Analysis configuration
    pub analysis: AnalysisConfig,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            upstream: UpstreamConfig::default(),
            analysis: AnalysisConfig::default(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
