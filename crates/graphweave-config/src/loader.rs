//! Loading configuration from disk and the environment.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{Config, ConfigError, ConfigResult};

/// Environment variable overriding `storage.endpoint`
pub const ENV_STORAGE_ENDPOINT: &str = "GRAPHWEAVE_STORAGE_ENDPOINT";
/// Environment variable overriding `llm.model`
pub const ENV_LLM_MODEL: &str = "GRAPHWEAVE_LLM_MODEL";
/// Environment variable overriding `llm.endpoint`
pub const ENV_LLM_ENDPOINT: &str = "GRAPHWEAVE_LLM_ENDPOINT";
/// Environment variable overriding `graph.read_mode`
pub const ENV_READ_MODE: &str = "GRAPHWEAVE_READ_MODE";

/// Loads [`Config`] from TOML or YAML files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Default config location: `<config dir>/graphweave/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("graphweave").join("config.toml"))
    }

    /// Load a config file, picking the format from its extension.
    pub async fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<Config> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: shown.clone(),
                source,
            })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        let config = Self::parse(&contents, &extension, &shown)?;
        config.validate()?;
        debug!(path = %shown, "Loaded configuration");
        Ok(config)
    }

    /// Load from `path`, else the default location if it exists, else
    /// defaults; then apply environment overrides and validate.
    pub async fn load(path: Option<PathBuf>) -> ConfigResult<Config> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path).await?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(default) => Self::load_from_file(default).await?,
                None => {
                    info!("No config file found, using defaults");
                    Config::default()
                }
            },
        };

        Self::apply_overrides(&mut config, |key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in
    /// production).
    pub fn apply_overrides(
        config: &mut Config,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<()> {
        if let Some(endpoint) = lookup(ENV_STORAGE_ENDPOINT) {
            config.storage.endpoint = endpoint;
        }
        if let Some(model) = lookup(ENV_LLM_MODEL) {
            config.llm.model = Some(model);
        }
        if let Some(endpoint) = lookup(ENV_LLM_ENDPOINT) {
            config.llm.endpoint = Some(endpoint);
        }
        if let Some(mode) = lookup(ENV_READ_MODE) {
            config.graph.read_mode = mode.parse().map_err(ConfigError::Invalid)?;
        }
        Ok(())
    }

    fn parse(contents: &str, extension: &str, path: &str) -> ConfigResult<Config> {
        match extension {
            #[cfg(feature = "toml")]
            "toml" => toml::from_str(contents).map_err(|e| ConfigError::Parse {
                path: path.to_string(),
                message: e.to_string(),
            }),
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
                path: path.to_string(),
                message: e.to_string(),
            }),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }
}
