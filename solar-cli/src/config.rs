//! `solar.toml`: optional settings file for the CLI.
//!
//! ```toml
//! [service]
//! backend = "http"                           # or "offline"
//! endpoint = "http://localhost:8000/api/v1"
//! timeout_secs = 30
//!
//! [offline]
//! catalog_dir = "./catalog"
//!
//! [logging]
//! level = "info"
//! file = "solar.log"
//! terminal = true
//!
//! [session]
//! email = "ana@example.com"
//! ```
//!
//! Every key is optional; unknown keys are rejected so typos surface.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use solar_core::ServiceConfig;
use solar_core::api::factory::DEFAULT_TIMEOUT_SECS;
use solar_http::DEFAULT_BASE_URL;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceSection {
    pub backend: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            backend: "http".to_string(),
            endpoint: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OfflineSection {
    pub catalog_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Bare level or any `EnvFilter` directive. Unset keeps `RUST_LOG`, or
    /// `info` without it.
    pub level: Option<String>,
    pub file: Option<PathBuf>,
    /// Echo log records to the terminal (stderr).
    pub terminal: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: None,
            file: None,
            terminal: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSection {
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub service: ServiceSection,
    pub offline: OfflineSection,
    pub logging: LoggingSection,
    pub session: SessionSection,
}

/// Values given on the command line; each one beats the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend: Option<String>,
    pub endpoint: Option<String>,
    pub catalog_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub quiet: bool,
    pub email: Option<String>,
}

impl AppConfig {
    pub fn from_toml(input: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `path`; a missing file is only an error when `required`.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content, path),
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(backend) = overrides.backend {
            self.service.backend = backend;
        }
        if let Some(endpoint) = overrides.endpoint {
            self.service.endpoint = endpoint;
        }
        if let Some(dir) = overrides.catalog_dir {
            self.offline.catalog_dir = Some(dir);
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = Some(level);
        }
        if let Some(file) = overrides.log_file {
            self.logging.file = Some(file);
        }
        if overrides.quiet {
            self.logging.terminal = false;
        }
        if let Some(email) = overrides.email {
            self.session.email = Some(email);
        }
    }

    /// What the service registry needs. The offline backend reads its
    /// catalog directory from the endpoint slot.
    pub fn service_config(&self) -> ServiceConfig {
        let endpoint = match (self.service.backend.as_str(), &self.offline.catalog_dir) {
            ("offline", Some(dir)) => dir.display().to_string(),
            _ => self.service.endpoint.clone(),
        };
        ServiceConfig {
            backend: self.service.backend.clone(),
            endpoint,
            timeout_secs: self.service.timeout_secs,
        }
    }
}
