//! Configuration management for spectrum-bridge
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.spectrum-bridge/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{BridgeError, Result};
use crate::retrieval::MAX_TOP_K;

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// External collaborator endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub ollama_host: String,
    pub ollama_port: u16,
    pub generation_model: String,
    /// `ollama` or `local`
    pub embedding_backend: String,
    pub embedding_model: String,
    pub qdrant_url: String,
    pub collection: String,
    pub image_endpoint: String,
    pub request_timeout_sec: u64,
}

/// Retrieval gateway defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub min_score: f32,
}

/// Fan-out scheduler budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub simplify_timeout_sec: u64,
    pub story_timeout_sec: u64,
    pub image_timeout_sec: u64,
    /// Character budget for context handed to the simplifier
    pub max_context_chars: usize,
    /// Upper bound on concurrent producers; `None` sizes the pool to the task count
    pub max_workers: Option<usize>,
    /// Where synthesized images are written; `None` keeps them in memory only
    pub image_output_dir: Option<String>,
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            ollama_host: "127.0.0.1".to_string(),
            ollama_port: 11434,
            generation_model: "llama3.1:8b".to_string(),
            embedding_backend: "ollama".to_string(),
            embedding_model: "all-minilm".to_string(),
            qdrant_url: "http://localhost:6334".to_string(),
            collection: "knowledge".to_string(),
            image_endpoint: "http://127.0.0.1:7860/generate".to_string(),
            request_timeout_sec: 120,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_score: 0.0,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            simplify_timeout_sec: 60,
            story_timeout_sec: 60,
            image_timeout_sec: 60,
            max_context_chars: 1000,
            max_workers: None,
            image_output_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(&config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| BridgeError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from the standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Standard configuration path
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".spectrum-bridge").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 || self.retrieval.top_k > MAX_TOP_K {
            return Err(BridgeError::ConfigError(format!(
                "top_k must be between 1 and {}",
                MAX_TOP_K
            )));
        }

        if self.retrieval.min_score.is_nan() || self.retrieval.min_score < 0.0 {
            return Err(BridgeError::ConfigError(
                "min_score must be a non-negative number".to_string(),
            ));
        }

        if self.scheduler.simplify_timeout_sec == 0
            || self.scheduler.story_timeout_sec == 0
            || self.scheduler.image_timeout_sec == 0
        {
            return Err(BridgeError::ConfigError(
                "task timeouts must be greater than 0".to_string(),
            ));
        }

        if self.scheduler.max_context_chars == 0 {
            return Err(BridgeError::ConfigError(
                "max_context_chars must be greater than 0".to_string(),
            ));
        }

        if self.scheduler.max_workers == Some(0) {
            return Err(BridgeError::ConfigError(
                "max_workers must be greater than 0".to_string(),
            ));
        }

        match self.services.embedding_backend.as_str() {
            "ollama" | "local" => {}
            other => {
                return Err(BridgeError::ConfigError(format!(
                    "Invalid embedding backend: {}",
                    other
                )))
            }
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(BridgeError::ConfigError(format!(
                    "Invalid log level: {}",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| BridgeError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BridgeError::ConfigError(format!("Failed to create config dir: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| BridgeError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Get Ollama base URL
    pub fn ollama_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.services.ollama_host, self.services.ollama_port
        )
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Resolved image output directory, if configured
    pub fn image_output_dir(&self) -> Option<PathBuf> {
        self.scheduler
            .image_output_dir
            .as_deref()
            .map(Self::expand_path)
    }
}

impl SchedulerConfig {
    pub fn simplify_timeout(&self) -> Duration {
        Duration::from_secs(self.simplify_timeout_sec)
    }

    pub fn story_timeout(&self) -> Duration {
        Duration::from_secs(self.story_timeout_sec)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_sec)
    }
}
