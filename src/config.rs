//! Process configuration.
//!
//! Read once at startup from the TOML file named by `PICKING_CONFIG`. A
//! missing variable or file means defaults. `PICKING_PORT` overrides the
//! listen port.
//!
//! ```toml
//! layout_file = "warehouse.toml"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [solver]
//! exact_threshold = 12
//! max_iterations = 5000
//! time_limit_ms = 200
//! ```

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::layout::{demo_warehouse, Warehouse};
use crate::solver::SolverConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PICKING_CONFIG";

/// Environment variable overriding `server.port`.
pub const PORT_ENV: &str = "PICKING_PORT";

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Print the coloured solve summary for every request.
    pub console: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7860,
            console: true,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub solver: SolverConfig,
    /// Layout file; the built-in demo warehouse when absent.
    pub layout_file: Option<PathBuf>,
}

impl AppConfig {
    /// Parses TOML text.
    ///
    /// ```
    /// use warehouse_picking::config::AppConfig;
    ///
    /// let config = AppConfig::parse("[solver]\nexact_threshold = 10\n").unwrap();
    /// assert_eq!(config.solver.exact_threshold, 10);
    /// assert_eq!(config.server.port, 7860);
    /// ```
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    ///
    /// A relative `layout_file` is resolved against the config file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)?;
        let mut config = Self::parse(&text)?;

        if let (Some(layout), Some(dir)) = (config.layout_file.as_mut(), path.parent()) {
            if layout.is_relative() {
                *layout = dir.join(&*layout);
            }
        }

        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Loads the configuration named by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            std::env::var(CONFIG_ENV).ok(),
            std::env::var(PORT_ENV).ok(),
        )
    }

    /// Resolves a configuration from the values of [`CONFIG_ENV`] and
    /// [`PORT_ENV`].
    pub fn from_vars(config_path: Option<String>, port: Option<String>) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(port) = port {
            config.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{} is not a valid port: {:?}", PORT_ENV, port)))?;
        }
        Ok(config)
    }

    /// Builds the warehouse this configuration points at.
    pub fn warehouse(&self) -> Result<Warehouse, ConfigError> {
        match &self.layout_file {
            Some(path) => Warehouse::load(path),
            None => Ok(demo_warehouse()),
        }
    }

    /// Address to bind.
    ///
    /// ```
    /// use warehouse_picking::config::AppConfig;
    ///
    /// let addr = AppConfig::default().socket_addr().unwrap();
    /// assert_eq!(addr.to_string(), "0.0.0.0:7860");
    /// ```
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("bad listen address {}:{}", self.server.host, self.server.port)))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".to_string()));
        }
        Ok(())
    }
}
