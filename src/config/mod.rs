//! Application configuration: file loading, environment overrides and the
//! injectable [`ConfigService`].

mod loader;
mod service;

pub use loader::{ConfigLoader, DEFAULT_CONFIG_FILES, FileFormat, apply_env_overrides};
pub use service::ConfigService;

use crate::cors::CorsPolicy;
use crate::dispatch::DEFAULT_BODY_LIMIT;
use serde::{Deserialize, Serialize};

/// Root configuration
///
/// ```toml
/// [app]
/// port = 8080
///
/// [cors]
/// origin = ["https://app.example.com"]
/// credentials = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app: AppSettings,
    /// CORS checks run only when a policy is configured
    pub cors: Option<CorsPolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    /// Largest request body buffered for a handler, in bytes
    pub body_limit: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl AppSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
