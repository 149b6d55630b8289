//! Command line arguments

use clap::Parser;
use std::path::{Path, PathBuf};

use crate::config::ServerConfig;
use crate::config_file::ConfigFile;
use crate::error::{RelayError, Result};

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Short link expander and video download relay.
#[derive(Parser, Debug, Clone)]
#[command(name = "douyin-relay")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host address to bind to (overrides the config file)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Write the default configuration to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub generate_config: Option<PathBuf>,
}

impl Args {
    /// Resolve the effective server configuration.
    ///
    /// An explicit `--config` must exist; the implicit `config.toml` is
    /// optional.
    pub fn load_config(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                if !path.exists() {
                    return Err(RelayError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                ConfigFile::from_file(path)?.into_server_config()
            }
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                ConfigFile::from_file(DEFAULT_CONFIG_PATH)?.into_server_config()
            }
            None => ServerConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }

        Ok(config)
    }
}
