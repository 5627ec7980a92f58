//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.base_url must not be empty".into(),
            ));
        }
        if self.auth.client_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.client_id must not be empty".into(),
            ));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api.base_url must not be empty".into(),
            ));
        }
        if self.api.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "api.timeout_ms must be > 0".into(),
            ));
        }
        if self.search.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "search.top_k must be > 0".into(),
            ));
        }
        if self.search.index_file.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "search.index_file must not be empty".into(),
            ));
        }
        if self.search.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "search.supported_formats must list at least one extension".into(),
            ));
        }
        Ok(())
    }
}
