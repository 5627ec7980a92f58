//! Per-invocation context handed to every command.
//!
//! A [`Session`] bundles the loaded configuration with the credential store,
//! so handlers receive their dependencies explicitly instead of reaching for
//! process-wide state.

use crate::api::VisionClient;
use crate::auth::{Credential, DeviceAuthPoller, HttpAuthTransport, TokenStore};
use crate::config::Config;
use crate::error::{LumenError, Result};

pub struct Session {
    config: Config,
    store: TokenStore,
}

impl Session {
    /// Build a session whose credential store lives at the configured path.
    pub fn new(config: Config) -> Self {
        let store = TokenStore::new(config.credentials_path());
        Self { config, store }
    }

    /// Build a session with an explicit credential store.
    pub fn with_store(config: Config, store: TokenStore) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// The stored credential, or [`LumenError::NotAuthenticated`].
    pub fn credential(&self) -> Result<Credential> {
        self.store.load()?.ok_or(LumenError::NotAuthenticated)
    }

    /// A vision client carrying the stored token.
    ///
    /// Fails with [`LumenError::NotAuthenticated`] before anything is sent
    /// when no credential is stored.
    pub fn vision_client(&self) -> Result<VisionClient> {
        let credential = self.credential()?;
        Ok(VisionClient::new(&self.config.api, credential.access_token))
    }

    /// Device-authorization poller against the configured auth service.
    pub fn device_poller(&self) -> DeviceAuthPoller<HttpAuthTransport> {
        DeviceAuthPoller::new(
            HttpAuthTransport::new(&self.config.auth),
            self.config.auth.client_id.clone(),
            self.config.auth.scope.clone(),
        )
    }
}
