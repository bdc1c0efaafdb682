/// Configuration loading from transbox.json
use crate::config::types::{Result, TransboxConfig, TransboxError};
use std::path::Path;

/// Environment variable overriding the generator endpoint
pub const ENV_GENERATOR_URL: &str = "OLLAMA_URL";
/// Environment variable overriding the generator model
pub const ENV_GENERATOR_MODEL: &str = "OLLAMA_MODEL";

impl TransboxConfig {
    /// Load configuration from a JSON file. Missing keys keep their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_content = std::fs::read_to_string(path).map_err(|e| {
            TransboxError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: TransboxConfig = serde_json::from_str(&config_content)
            .map_err(|e| TransboxError::Config(format!("Failed to parse config JSON: {}", e)))?;

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load ./transbox.json when present, otherwise the built-in defaults,
    /// then apply environment overrides.
    pub fn load_default() -> Result<Self> {
        let config_path = std::env::current_dir()
            .map_err(|e| TransboxError::Config(format!("Failed to get current directory: {}", e)))?
            .join("transbox.json");

        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            log::debug!("transbox.json not found in current directory, using defaults");
            Self::default()
        };

        Ok(config.with_env_overrides())
    }

    /// Load from an explicit path when given, otherwise fall back to [`Self::load_default`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self::load_from_file(path)?.with_env_overrides()),
            None => Self::load_default(),
        }
    }

    /// Apply `OLLAMA_URL` / `OLLAMA_MODEL` on top of file or default values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_GENERATOR_URL).filter(|v| !v.trim().is_empty()) {
            self.generator.base_url = url;
        }
        if let Some(model) = lookup(ENV_GENERATOR_MODEL).filter(|v| !v.trim().is_empty()) {
            self.generator.model = model;
        }
        self
    }
}
