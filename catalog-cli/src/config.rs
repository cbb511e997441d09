//! Layered CLI configuration
//!
//! Sources, lowest precedence first: built-in defaults, the optional
//! `planos-admin.{yaml,toml,json}` file (or the one given with `--config`),
//! `PLANOS__*` environment variables, then command-line flags.

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use catalog_client::{ClientConfig, DEFAULT_API_URL};
use error_common::{CatalogError, Result};

/// Base name of the optional configuration file in the working directory
pub const CONFIG_BASENAME: &str = "planos-admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminConfig {
    pub api_url: String,
    pub timeout_seconds: u64,
    /// `development` or `production`; production switches logs to JSON
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_environment() -> String {
    "development".to_string()
}

impl AdminConfig {
    /// Load defaults, file and environment layers.
    ///
    /// An explicit `path` must exist; the implicit file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(CONFIG_BASENAME).required(false),
        };

        Config::builder()
            .set_default("api_url", DEFAULT_API_URL)
            .and_then(|builder| builder.set_default("timeout_seconds", 30_i64))
            .and_then(|builder| builder.set_default("environment", default_environment()))
            .map_err(config_error)?
            .add_source(file)
            .add_source(Environment::with_prefix("PLANOS").separator("__").try_parsing(true))
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(config_error)
    }

    /// Apply command-line overrides
    #[must_use]
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(api_url) = api_url {
            self.api_url = api_url;
        }
        self
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn client(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.api_url.clone(),
            timeout_seconds: self.timeout_seconds,
        }
    }
}

fn config_error(err: config::ConfigError) -> CatalogError {
    CatalogError::Config(err.to_string())
}
