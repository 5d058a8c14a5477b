use crate::config::Config;
use crate::error::{Result, ZephyrError};
use std::path::{Path, PathBuf};

/// Files looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["zephyr.config.toml", "zephyr.config.json"];

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "json" => Ok(FileFormat::Json),
            "toml" => Ok(FileFormat::Toml),
            other => Err(ZephyrError::Config(format!(
                "Unsupported config format '{other}' for {}",
                path.display()
            ))),
        }
    }

    pub fn parse(self, content: &str) -> Result<Config> {
        match self {
            FileFormat::Json => serde_json::from_str(content)
                .map_err(|e| ZephyrError::Config(format!("JSON parse error: {e}"))),
            FileFormat::Toml => {
                toml::from_str(content).map_err(|e| ZephyrError::Config(format!("TOML parse error: {e}")))
            }
        }
    }
}

/// Loads [`Config`] once at startup
///
/// Order: `.env` (if present), the config file (defaults when there is
/// none), then `HOST` and `PORT` from the environment.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    dotenv: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Look for the default config files in the working directory
    pub fn new() -> Self {
        Self {
            path: None,
            dotenv: true,
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            dotenv: true,
        }
    }

    /// Skip reading `.env`
    pub fn without_dotenv(mut self) -> Self {
        self.dotenv = false;
        self
    }

    pub async fn load(&self) -> Result<Config> {
        if self.dotenv {
            match dotenvy::dotenv() {
                Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
                Err(e) if e.not_found() => {}
                Err(e) => tracing::warn!(error = %e, "Failed to read .env"),
            }
        }

        let mut config = match self.discover() {
            Some(path) => Self::read(&path).await?,
            None => {
                tracing::info!("No configuration file found, using defaults");
                Config::default()
            }
        };

        apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// The file that [`ConfigLoader::load`] would read
    pub fn discover(&self) -> Option<PathBuf> {
        match &self.path {
            Some(path) if path.is_file() => Some(path.clone()),
            Some(path) => {
                tracing::warn!(path = %path.display(), "Configuration file not found");
                None
            }
            None => DEFAULT_CONFIG_FILES
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.is_file()),
        }
    }

    pub async fn read(path: &Path) -> Result<Config> {
        let format = FileFormat::from_path(path)?;
        let content = tokio::fs::read_to_string(path).await?;
        let config = format.parse(&content)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

/// Apply `HOST` and `PORT` overrides using `lookup` to read variables
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(host) = lookup("HOST") {
        config.app.host = host;
    }

    if let Some(port) = lookup("PORT") {
        config.app.port = port
            .trim()
            .parse()
            .map_err(|_| ZephyrError::Config(format!("PORT must be a port number, got '{port}'")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cors::AllowList;
    use std::collections::HashMap;

    #[test]
    fn test_parse_toml() {
        let config = FileFormat::Toml
            .parse(
                r#"
                [app]
                port = 8080

                [cors]
                origin = ["https://app.example.com"]
                credentials = false
                "#,
            )
            .unwrap();

        assert_eq!(config.app.port, 8080);
        assert_eq!(config.app.host, "0.0.0.0");
        let cors = config.cors.unwrap();
        assert_eq!(cors.origin, AllowList::Many(vec!["https://app.example.com".into()]));
        assert!(!cors.credentials);
    }

    #[test]
    fn test_parse_json_defaults() {
        let config = FileFormat::Json.parse("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.app.port, 3000);
        assert!(config.cors.is_none());
    }

    #[test]
    fn test_unknown_format() {
        assert!(FileFormat::from_path(Path::new("zephyr.config.yaml")).is_err());
        assert_eq!(
            FileFormat::from_path(Path::new("a/b/zephyr.config.JSON")).unwrap(),
            FileFormat::Json
        );
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([("PORT", "9090"), ("HOST", "127.0.0.1")]);
        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.app.address(), "127.0.0.1:9090");

        let mut config = Config::default();
        let error = apply_env_overrides(&mut config, |_| Some("http".into())).unwrap_err();
        assert!(matches!(error, ZephyrError::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_explicit_file_uses_defaults() {
        let loader = ConfigLoader::from_path("does/not/exist.toml").without_dotenv();
        assert_eq!(loader.discover(), None);
    }

    #[tokio::test]
    async fn test_read_file() {
        let path = std::env::temp_dir().join(format!("zephyr-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, r#"{ "app": { "port": 4321, "bodyLimit": 1024 } }"#)
            .await
            .unwrap();

        let config = ConfigLoader::read(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(config.app.port, 4321);
        assert_eq!(config.app.body_limit, 1024);
    }
}
