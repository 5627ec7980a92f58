//! HTTP boundary to the auth service.
//!
//! The [`AuthTransport`] trait is the seam the device poller drives; the
//! reqwest implementation talks to the device-authorization and session
//! endpoints of the auth service.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::{DeviceAuthorization, OAuthErrorBody, PollResponse, TokenResponse, UserInfo};
use crate::config::AuthConfig;
use crate::error::AuthError;

/// Grant type for the OAuth2 device-authorization grant (RFC 8628).
pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Requests against the auth service.
#[async_trait]
pub trait AuthTransport: Send + Sync {
    /// Start a device authorization.
    async fn request_device_code(
        &self,
        client_id: &str,
        scope: &str,
    ) -> Result<DeviceAuthorization, AuthError>;

    /// Issue one token poll for `device_code`.
    ///
    /// Protocol errors (`authorization_pending`, `slow_down`, ...) come back
    /// as `Ok(PollResponse::Error)`; `Err` is reserved for transport failures
    /// and unreadable responses.
    async fn poll_token(
        &self,
        client_id: &str,
        device_code: &str,
    ) -> Result<PollResponse, AuthError>;

    /// Fetch the user attached to `access_token`.
    async fn fetch_session(&self, access_token: &str) -> Result<UserInfo, AuthError>;
}

/// reqwest-backed [`AuthTransport`].
pub struct HttpAuthTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthTransport {
    pub fn new(config: &AuthConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(format!("lumen/{}", crate::VERSION))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {e}");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[derive(Serialize)]
struct DeviceCodeRequest<'a> {
    client_id: &'a str,
    scope: &'a str,
}

#[derive(Serialize)]
struct DeviceTokenRequest<'a> {
    grant_type: &'a str,
    device_code: &'a str,
    client_id: &'a str,
}

#[derive(Deserialize)]
struct SessionResponse {
    #[serde(default)]
    user: Option<UserInfo>,
}

#[async_trait]
impl AuthTransport for HttpAuthTransport {
    async fn request_device_code(
        &self,
        client_id: &str,
        scope: &str,
    ) -> Result<DeviceAuthorization, AuthError> {
        let resp = self
            .client
            .post(self.url("device/code"))
            .json(&DeviceCodeRequest { client_id, scope })
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(AuthError::Request(format!("HTTP {status}: {body}")));
        }

        serde_json::from_str(&body)
            .map_err(|e| AuthError::Request(format!("malformed device code response: {e}")))
    }

    async fn poll_token(
        &self,
        client_id: &str,
        device_code: &str,
    ) -> Result<PollResponse, AuthError> {
        let resp = self
            .client
            .post(self.url("device/token"))
            .json(&DeviceTokenRequest {
                grant_type: DEVICE_CODE_GRANT_TYPE,
                device_code,
                client_id,
            })
            .send()
            .await
            .map_err(|e| AuthError::Poll(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AuthError::Poll(e.to_string()))?;
        parse_poll_response(status.as_u16(), &body)
    }

    async fn fetch_session(&self, access_token: &str) -> Result<UserInfo, AuthError> {
        let resp = self
            .client
            .get(self.url("get-session"))
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AuthError::Session(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AuthError::Session(e.to_string()))?;
        if !status.is_success() {
            return Err(AuthError::Session(format!("HTTP {status}: {body}")));
        }
        parse_session_response(&body)
    }
}

/// Interpret a token endpoint response.
///
/// Success bodies must carry a token; anything else must be an OAuth error
/// body, otherwise the response is reported as a poll failure.
pub(crate) fn parse_poll_response(status: u16, body: &str) -> Result<PollResponse, AuthError> {
    if (200..300).contains(&status) {
        if let Ok(token) = serde_json::from_str::<TokenResponse>(body) {
            return Ok(PollResponse::Token(token));
        }
    }
    // Some servers answer pending polls with 200 and an error body.
    if let Ok(err) = serde_json::from_str::<OAuthErrorBody>(body) {
        return Ok(PollResponse::Error(err));
    }
    Err(AuthError::Poll(format!(
        "unexpected token response (HTTP {status}): {body}"
    )))
}

pub(crate) fn parse_session_response(body: &str) -> Result<UserInfo, AuthError> {
    let session: Option<SessionResponse> = serde_json::from_str(body)
        .map_err(|e| AuthError::Session(format!("malformed session response: {e}")))?;
    session
        .and_then(|s| s.user)
        .ok_or_else(|| AuthError::Session("no active session".to_string()))
}
