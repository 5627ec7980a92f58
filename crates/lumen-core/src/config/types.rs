//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Credential file location. Empty means the platform config directory.
    pub credentials_file: String,
}

/// Auth service settings for the device-authorization flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Base URL of the auth service (device and session endpoints live below it)
    pub base_url: String,

    /// OAuth client identifier sent with every device request
    pub client_id: String,

    /// Requested scope
    pub scope: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: "https://lumen.ai/api/auth".to_string(),
            client_id: "lumen-cli".to_string(),
            scope: "openid profile email".to_string(),
        }
    }
}

/// Vision API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the vision API
    pub base_url: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.lumen.ai".to_string(),
            timeout_ms: 120_000,
        }
    }
}

/// Local search / embedding index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Index file name, created in the directory being searched
    pub index_file: String,

    /// Image extensions considered during indexing (case-insensitive)
    pub supported_formats: Vec<String>,

    /// Number of results shown
    pub top_k: usize,

    /// Default embedding mode sent to the API
    pub mode: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_file: ".index.db".to_string(),
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "gif".to_string(),
                "bmp".to_string(),
                "tiff".to_string(),
            ],
            top_k: 5,
            mode: "default".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
