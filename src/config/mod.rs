mod loader;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::api::GenerationParams;

pub use loader::{environment, load_config, ENV_BACKEND_URL, ENV_PREFIX};

/// Main application configuration
///
/// Resolved once at startup (file, then environment, then CLI flags) and
/// shared behind an `Arc` afterwards. Nothing mutates it while serving.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub generation: GenerationParams,
}

/// Relay server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8070
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Request body shape the backend expects
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendContract {
    /// `{prompt, temperature, top_p, max_new_tokens, do_sample}`
    #[default]
    Prompt,
    /// `{message, conversationHistory}`
    Chat,
}

impl BackendContract {
    /// Path suffix used when none is configured
    pub fn default_path(&self) -> &'static str {
        match self {
            BackendContract::Prompt => "/generate",
            BackendContract::Chat => "/chat",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendContract::Prompt => "prompt",
            BackendContract::Chat => "chat",
        }
    }
}

/// Text-generation backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Backend base URL (e.g., "http://localhost:8000"). Required to serve.
    #[serde(default)]
    pub url: Option<String>,
    /// Path appended to the base URL; defaults per contract
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub contract: BackendContract,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// TLS configuration options
    #[serde(default)]
    pub tls: Option<TlsConfig>,
    /// API key sent as a bearer token
    #[serde(default)]
    pub api_key: Option<String>,
}

/// TLS configuration for backend connections
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Accept invalid certificates (self-signed, expired)
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Path to custom CA certificate (PEM format)
    pub ca_cert_path: Option<String>,
}

fn default_timeout() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            path: None,
            contract: BackendContract::default(),
            timeout_seconds: default_timeout(),
            tls: None,
            api_key: None,
        }
    }
}

impl BackendConfig {
    /// Returns the base URL with trailing slash stripped
    pub fn base_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/'))
            .filter(|u| !u.is_empty())
    }

    /// Path suffix with exactly one leading slash
    pub fn path(&self) -> String {
        match self.path.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => format!("/{}", p.trim_start_matches('/')),
            None => self.contract.default_path().to_string(),
        }
    }

    /// Full generation endpoint, if a base URL is configured
    pub fn endpoint(&self) -> Option<String> {
        self.base_url().map(|base| format!("{}{}", base, self.path()))
    }

    /// Returns true if the URL uses HTTPS
    pub fn is_tls(&self) -> bool {
        self.base_url()
            .map(|u| u.to_lowercase().starts_with("https://"))
            .unwrap_or(false)
    }
}

impl AppConfig {
    /// Load `path` if present, then apply `RELAY_*` environment overrides
    ///
    /// A missing file is not an error: a relay configured purely through the
    /// environment is the common deployment.
    pub fn resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults and environment");
        }
        load_config(path, environment())
    }

    /// Check that the relay can serve requests with this configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.backend.base_url().ok_or(ConfigError::MissingBackendUrl)?;

        let parsed = url::Url::parse(base)
            .map_err(|e| ConfigError::Validation(format!("invalid backend URL {:?}: {}", base, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "backend URL must be http or https, got {:?}",
                parsed.scheme()
            )));
        }

        if self.backend.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "backend.timeout_seconds must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Backend URL is not configured (set backend.url or {})", ENV_BACKEND_URL)]
    MissingBackendUrl,

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
