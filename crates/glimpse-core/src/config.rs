//! Configuration management for glimpse
//!
//! Loads configuration with priority:
//! 1. config.yaml (or a specified config file)
//! 2. Environment variable overrides
//! 3. Defaults

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Top-level application configuration.
///
/// Read-only after startup; mutations go through [`Config::save`], which
/// rewrites the backing file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub extension: ExtensionConfig,
}

/// Screen capture settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Ticker period in seconds; a floor of 1 s is enforced by the pipeline
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,

    /// JPEG quality in (0, 100]; out-of-range values fall back to 60
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Upper bound on capture width; 0 disables resizing on this axis
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// Upper bound on capture height; 0 disables resizing on this axis
    #[serde(default = "default_max_height")]
    pub max_height: u32,

    /// Start the capture loop at boot
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Vision/chat endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Optional secondary chat endpoint key; empty reuses the primary
    /// endpoint for both roles
    #[serde(default)]
    pub cerebras_api_key: String,

    #[serde(default = "default_cerebras_model")]
    pub cerebras_model: String,
}

/// Memory store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_memory_base_url")]
    pub base_url: String,

    #[serde(default = "default_user_id")]
    pub user_id: String,

    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// Wire dialect spoken by the backend, fixed at client construction
    #[serde(default)]
    pub dialect: Dialect,
}

/// Request shape used when talking to the memory service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Message,
    Content,
}

/// General behaviour toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub verbose: bool,

    /// When false, captures are taken but never analysed or stored
    #[serde(default = "default_true")]
    pub process_on_capture: bool,

    /// How many recent memories feed the rolling analysis context
    #[serde(default = "default_memory_window")]
    pub memory_window: usize,
}

/// Browser-extension HTTP API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_extension_port")]
    pub port: u16,

    /// Extra origins allowed through CORS in addition to browser-extension
    /// origins, e.g. local dev servers
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            quality: default_quality(),
            max_width: default_max_width(),
            max_height: default_max_height(),
            enabled: true,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout_seconds(),
            cerebras_api_key: String::new(),
            cerebras_model: default_cerebras_model(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_memory_base_url(),
            user_id: default_user_id(),
            collection_name: default_collection_name(),
            dialect: Dialect::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            process_on_capture: true,
            memory_window: default_memory_window(),
        }
    }
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_extension_port(),
            allowed_origins: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            llm: LlmConfig::default(),
            memory: MemoryConfig::default(),
            app: AppConfig::default(),
            extension: ExtensionConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `config.yaml` in the working directory,
    /// falling back to defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.yaml"))
    }

    /// Load configuration from a specific file, then apply environment
    /// variable overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            tracing::debug!("Loading configuration from {:?}", path);
            let contents = fs::read_to_string(path)
                .map_err(|e| Error::config(format!("reading config file {:?}: {}", path, e)))?;
            serde_yaml::from_str(&contents)
                .map_err(|e| Error::config(format!("parsing config file {:?}: {}", path, e)))?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides on top of the loaded values.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("LM_STUDIO_URL") {
            if !val.is_empty() {
                self.llm.base_url = val;
            }
        }
        if let Ok(val) = env::var("MEM0_URL") {
            if !val.is_empty() {
                self.memory.base_url = val;
            }
        }
        if let Ok(val) = env::var("MEM0_API_KEY") {
            if !val.is_empty() {
                self.memory.api_key = val;
            }
        }
        if let Ok(val) = env::var("CEREBRAS_API_KEY") {
            if !val.is_empty() {
                self.llm.cerebras_api_key = val;
            }
        }
    }

    /// Persist the current configuration by rewriting the config file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)
            .map_err(|e| Error::config(format!("serializing config: {}", e)))?;
        fs::write(path, data)?;
        Ok(())
    }
}

fn default_interval_seconds() -> u64 {
    30
}

fn default_quality() -> u8 {
    60
}

fn default_max_width() -> u32 {
    1280
}

fn default_max_height() -> u32 {
    720
}

fn default_llm_base_url() -> String {
    "http://localhost:1234/v1".to_string()
}

fn default_llm_model() -> String {
    "local-model".to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_cerebras_model() -> String {
    "gpt-oss-120b".to_string()
}

fn default_memory_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_user_id() -> String {
    "default_user".to_string()
}

fn default_collection_name() -> String {
    "screen_memories_v3".to_string()
}

fn default_memory_window() -> usize {
    10
}

fn default_extension_port() -> u16 {
    7345
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.capture.interval_seconds, 30);
        assert_eq!(config.capture.quality, 60);
        assert_eq!(config.llm.base_url, "http://localhost:1234/v1");
        assert_eq!(config.memory.dialect, Dialect::Message);
        assert_eq!(config.extension.port, 7345);
        assert!(config.app.process_on_capture);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
capture:
  interval_seconds: 5
memory:
  dialect: content
  collection_name: my_memories
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.capture.interval_seconds, 5);
        assert_eq!(config.capture.quality, 60);
        assert_eq!(config.memory.dialect, Dialect::Content);
        assert_eq!(config.memory.collection_name, "my_memories");
        assert_eq!(config.memory.user_id, "default_user");
    }

    #[test]
    fn test_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.capture.max_width, config.capture.max_width);
        assert_eq!(parsed.memory.dialect, config.memory.dialect);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/config.yaml")).unwrap();
        assert_eq!(config.capture.interval_seconds, 30);
    }
}
