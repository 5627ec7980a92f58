//! Wire and storage types for authentication.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Poll interval used when the server omits one.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

fn default_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

/// Identity of the logged-in user, as reported by the session endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// The persisted credential record.
///
/// `access_token` is never empty for a stored record; [`super::TokenStore`]
/// refuses to save one that is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

impl Credential {
    /// Display label for the user, falling back to the email or a placeholder.
    pub fn display_name(&self) -> String {
        match &self.user {
            Some(user) if !user.name.is_empty() && !user.email.is_empty() => {
                format!("{} <{}>", user.name, user.email)
            }
            Some(user) if !user.email.is_empty() => user.email.clone(),
            Some(user) if !user.name.is_empty() => user.name.clone(),
            _ => "unknown user".to_string(),
        }
    }
}

/// Server response to a device code request.
///
/// Lives for one `login` invocation and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceAuthorization {
    /// Opaque code used only as the polling key
    pub device_code: String,

    /// Human-facing code the user types at the verification page
    pub user_code: String,

    pub verification_uri: String,

    /// Verification URL with the user code pre-filled, if the server offers one
    #[serde(default)]
    pub verification_uri_complete: Option<String>,

    /// Seconds between polls
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Seconds until the device code expires
    pub expires_in: u64,
}

/// Successful token response from the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,

    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Convert into a credential, resolving `expires_in` against `now`.
    ///
    /// A lifetime too large to represent leaves `expires_at` unset.
    pub fn into_credential(self, now: DateTime<Utc>) -> Credential {
        let expires_at = self.expires_in.and_then(|secs| {
            let expiry = Duration::try_seconds(secs).and_then(|d| now.checked_add_signed(d));
            if expiry.is_none() {
                tracing::warn!(expires_in = secs, "Ignoring out-of-range token lifetime");
            }
            expiry
        });
        Credential {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: None,
        }
    }
}

/// OAuth error body returned while polling (`{error, error_description}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthErrorBody {
    pub error: String,

    #[serde(default)]
    pub error_description: Option<String>,
}

/// One answer from the token endpoint: either a token or a protocol error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResponse {
    Token(TokenResponse),
    Error(OAuthErrorBody),
}

impl PollResponse {
    /// Shorthand for an error response without a description.
    pub fn error(code: &str) -> Self {
        PollResponse::Error(OAuthErrorBody {
            error: code.to_string(),
            error_description: None,
        })
    }
}
