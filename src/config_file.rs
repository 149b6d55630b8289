//! Configuration file support
//!
//! Loads server configuration from TOML files. Every section and most keys
//! are optional; anything left out falls back to `ServerConfig::default()`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{AnalysisConfig, ServerConfig, UpstreamConfig};
use crate::error::{RelayError, Result};

/// Configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: Option<ServerSettings>,
    /// Outbound request settings
    pub upstream: Option<UpstreamSettings>,
    /// Analysis API settings
    pub analysis: Option<AnalysisSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: Option<String>,
    /// Port to listen on
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    pub user_agent: Option<String>,
    /// Empty string disables the Referer header
    pub referer: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_redirects: Option<usize>,
    pub stream_idle_timeout_secs: Option<u64>,
    pub stream_buffer_chunks: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| RelayError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| RelayError::Config(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let defaults = ServerConfig::default();
        Self {
            server: Some(ServerSettings {
                host: Some(defaults.host),
                port: Some(defaults.port),
            }),
            upstream: Some(UpstreamSettings {
                user_agent: Some(defaults.upstream.user_agent),
                referer: defaults.upstream.referer,
                connect_timeout_secs: Some(defaults.upstream.connect_timeout_secs),
                request_timeout_secs: Some(defaults.upstream.request_timeout_secs),
                max_redirects: Some(defaults.upstream.max_redirects),
                stream_idle_timeout_secs: Some(defaults.upstream.stream_idle_timeout_secs),
                stream_buffer_chunks: Some(defaults.upstream.stream_buffer_chunks),
            }),
            analysis: Some(AnalysisSettings {
                api_url: Some(defaults.analysis.api_url),
            }),
            logging: Some(LoggingSettings {
                level: defaults.log_level,
                format: Some(defaults.log_format),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        let upstream_defaults = UpstreamConfig::default();

        let (host, port) = match self.server {
            Some(s) => (
                s.host.unwrap_or(defaults.host),
                s.port.unwrap_or(defaults.port),
            ),
            None => (defaults.host, defaults.port),
        };

        let upstream = match self.upstream {
            Some(u) => UpstreamConfig {
                user_agent: u.user_agent.unwrap_or(upstream_defaults.user_agent),
                referer: match u.referer {
                    Some(r) if r.is_empty() => None,
                    Some(r) => Some(r),
                    None => upstream_defaults.referer,
                },
                connect_timeout_secs: u
                    .connect_timeout_secs
                    .unwrap_or(upstream_defaults.connect_timeout_secs),
                request_timeout_secs: u
                    .request_timeout_secs
                    .unwrap_or(upstream_defaults.request_timeout_secs),
                max_redirects: u.max_redirects.unwrap_or(upstream_defaults.max_redirects),
                stream_idle_timeout_secs: u
                    .stream_idle_timeout_secs
                    .unwrap_or(upstream_defaults.stream_idle_timeout_secs),
                // A zero-capacity channel would panic at construction.
                stream_buffer_chunks: u
                    .stream_buffer_chunks
                    .unwrap_or(upstream_defaults.stream_buffer_chunks)
                    .max(1),
            },
            None => upstream_defaults,
        };

        let analysis = AnalysisConfig {
            api_url: self
                .analysis
                .and_then(|a| a.api_url)
                .unwrap_or(defaults.analysis.api_url),
        };

        let (log_level, log_format) = match self.logging {
            Some(l) => (l.level, l.format.unwrap_or(defaults.log_format)),
            None => (defaults.log_level, defaults.log_format),
        };

        ServerConfig {
            host,
            port,
            upstream,
            analysis,
            log_level,
            log_format,
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    ConfigFile::default_config().to_file(path)
}
