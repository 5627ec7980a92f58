//! Credential persistence across invocations.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::types::Credential;
use crate::error::StoreError;

/// Stores a single [`Credential`] as JSON at a fixed path.
///
/// There is no expiry enforcement: a stale token is only discovered when the
/// remote API rejects it.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored credential, if any.
    ///
    /// A record with an empty access token counts as absent.
    pub fn load(&self) -> Result<Option<Credential>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let credential: Credential = serde_json::from_str(&content)?;
        if credential.access_token.is_empty() {
            tracing::warn!(
                "Ignoring credential without access token at {:?}",
                self.path
            );
            return Ok(None);
        }
        Ok(Some(credential))
    }

    /// Persist a credential, replacing any existing one.
    pub fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        if credential.access_token.is_empty() {
            return Err(StoreError::EmptyToken);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(credential)?;
        let mut file = open_private(&self.path)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;

        tracing::debug!("Credential saved to {:?}", self.path);
        Ok(())
    }

    /// Remove the stored credential. Returns whether one existed.
    pub fn clear(&self) -> Result<bool, StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Credential removed from {:?}", self.path);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
