use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ParleyError, Result};
use crate::types::{BackendDescriptor, BackendKind};

/// Top-level configuration for Parley.
///
/// Loaded from `~/.parley/config.toml` by default, then overlaid with
/// environment variables. Built once at startup and shared read-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
}

impl ParleyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParleyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ParleyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay values from the process environment.
    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Overlay values from an environment lookup.
    ///
    /// Recognized keys: `OLLAMA_API_URL`, `MODEL_NAME`, `OLLAMA_CHAT_MODEL`,
    /// `GEMINI_API_KEY`, `GEMINI_MODEL`, `PARLEY_HOST`, `PARLEY_PORT`.
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("OLLAMA_API_URL") {
            self.ollama.base_url = normalize_ollama_url(&url);
        }
        if let Some(model) = get("MODEL_NAME") {
            self.ollama.vision_model = model;
        }
        if let Some(model) = get("OLLAMA_CHAT_MODEL") {
            self.ollama.chat_model = model;
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            self.gemini.api_key = key;
        }
        if let Some(model) = get("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(host) = get("PARLEY_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PARLEY_PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!(value = %port, "Ignoring invalid PARLEY_PORT"),
            }
        }
    }

    /// Descriptor for the local text-chat backend using `model`.
    pub fn local_chat_backend(&self, model: &str) -> BackendDescriptor {
        BackendDescriptor::new(
            BackendKind::OllamaGenerate,
            "Ollama",
            &self.ollama.base_url,
            model,
        )
    }

    /// Descriptor for the local vision backend.
    pub fn vision_backend(&self) -> BackendDescriptor {
        BackendDescriptor::new(
            BackendKind::OllamaVision,
            "Ollama",
            &self.ollama.base_url,
            &self.ollama.vision_model,
        )
    }

    /// Descriptor for the cloud text-chat backend.
    pub fn cloud_chat_backend(&self) -> BackendDescriptor {
        BackendDescriptor::new(
            BackendKind::Gemini,
            "Gemini",
            &self.gemini.base_url,
            &self.gemini.model,
        )
    }
}

/// Accept either a base URL or a full generate endpoint URL.
fn normalize_ollama_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    trimmed
        .strip_suffix("/api/generate")
        .unwrap_or(trimmed)
        .to_string()
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body (image uploads).
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Local Ollama server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL, e.g. `http://localhost:11434`.
    pub base_url: String,
    /// Default model for the text chatbot.
    pub chat_model: String,
    /// Model for image analysis and image chat.
    pub vision_model: String,
    /// Timeout for a single generate request.
    pub request_timeout_secs: u64,
    /// Timeout for the model listing at startup.
    pub tags_timeout_secs: u64,
    /// Timeout for the startup connectivity probe.
    pub probe_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            vision_model: "llava:7b".to_string(),
            request_timeout_secs: 30,
            tags_timeout_secs: 5,
            probe_timeout_secs: 10,
        }
    }
}

/// Cloud Gemini settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    /// API key. Empty means the cloud mode reports an error on use.
    pub api_key: String,
    /// Number of trailing turns included as context.
    pub history_window: usize,
    pub request_timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key: String::new(),
            history_window: 3,
            request_timeout_secs: 30,
        }
    }
}

/// Retry policy for the vision backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub delay_ms: u64,
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_ms: 5_000,
        }
    }
}

/// Text chat session retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds without a message before a session is evicted.
    pub idle_ttl_secs: u64,
    /// Upper bound on live sessions; the least recently active idle one
    /// makes room for a new one.
    pub max_sessions: usize,
    /// Seconds between background eviction sweeps.
    pub sweep_interval_secs: u64,
}

impl SessionConfig {
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: 3_600,
            max_sessions: 1_000,
            sweep_interval_secs: 60,
        }
    }
}
