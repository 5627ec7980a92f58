//! OAuth2 device-authorization polling.
//!
//! [`DevicePoll`] is the state machine: it consumes one token-endpoint
//! response at a time and decides whether polling continues, at which
//! interval, or how it ended. [`DeviceAuthPoller`] drives it with a plain
//! sleep-then-request loop.
//!
//! ```text
//! Pending ──authorization_pending──▶ Pending
//!    │ ╲──slow_down (+5s)──▶ SlowedDown ──(pending|slow_down)──▶ SlowedDown
//!    ├──token──────────▶ Done
//!    ├──access_denied──▶ Denied
//!    ├──expired_token──▶ Expired
//!    └──other / network▶ Failed
//! ```
//!
//! The server's `expires_in` is not enforced locally; the loop ends only when
//! the server answers with a terminal response.

use std::time::Duration;

use chrono::Utc;

use super::transport::AuthTransport;
use super::types::{Credential, DeviceAuthorization, PollResponse, TokenResponse};
use crate::error::AuthError;

/// Amount added to the poll interval on every `slow_down`.
pub const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

/// State of one device-authorization poll session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// Waiting for the user; interval unchanged so far
    Pending,
    /// Server asked us to back off at least once
    SlowedDown,
    /// Token received
    Done,
    /// User declined
    Denied,
    /// Device code expired server-side
    Expired,
    /// Any other error, with its description
    Failed(String),
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Pending | PollState::SlowedDown)
    }
}

/// Snapshot handed to the progress observer after each non-terminal poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollProgress {
    /// Number of polls issued so far
    pub attempt: u32,
    pub state: PollState,
    /// Wait before the next poll
    pub interval: Duration,
}

/// Device poll state machine.
#[derive(Debug, Clone)]
pub struct DevicePoll {
    interval: Duration,
    state: PollState,
    attempts: u32,
}

impl DevicePoll {
    pub fn new(initial_interval: Duration) -> Self {
        Self {
            interval: initial_interval,
            state: PollState::Pending,
            attempts: 0,
        }
    }

    /// Current wait between polls. Never decreases within a session.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn progress(&self) -> PollProgress {
        PollProgress {
            attempt: self.attempts,
            state: self.state.clone(),
            interval: self.interval,
        }
    }

    /// Apply one token-endpoint response.
    ///
    /// Returns `None` while polling should continue, or the final outcome once
    /// the session reaches a terminal state.
    pub fn apply(&mut self, response: PollResponse) -> Option<Result<TokenResponse, AuthError>> {
        if self.state.is_terminal() {
            return Some(Err(AuthError::Poll(
                "poll session already finished".to_string(),
            )));
        }
        self.attempts += 1;

        let err = match response {
            PollResponse::Token(token) => {
                self.state = PollState::Done;
                return Some(Ok(token));
            }
            PollResponse::Error(err) => err,
        };

        match err.error.as_str() {
            "authorization_pending" => None,
            "slow_down" => {
                self.interval += SLOW_DOWN_STEP;
                self.state = PollState::SlowedDown;
                None
            }
            "access_denied" => {
                self.state = PollState::Denied;
                Some(Err(AuthError::AccessDenied))
            }
            "expired_token" => {
                self.state = PollState::Expired;
                Some(Err(AuthError::Expired))
            }
            _ => {
                let description = err
                    .error_description
                    .filter(|d| !d.is_empty())
                    .unwrap_or(err.error);
                self.state = PollState::Failed(description.clone());
                Some(Err(AuthError::Poll(description)))
            }
        }
    }

    /// Record a transport failure. Always terminal; there is no retry.
    pub fn fail(&mut self, error: AuthError) -> AuthError {
        self.attempts += 1;
        let description = match &error {
            AuthError::Poll(msg) => msg.clone(),
            other => other.to_string(),
        };
        self.state = PollState::Failed(description.clone());
        AuthError::Poll(description)
    }
}

/// Runs the device-authorization grant against an [`AuthTransport`].
pub struct DeviceAuthPoller<T> {
    transport: T,
    client_id: String,
    scope: String,
}

impl<T: AuthTransport> DeviceAuthPoller<T> {
    pub fn new(transport: T, client_id: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            transport,
            client_id: client_id.into(),
            scope: scope.into(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Ask the server for a device code and user code.
    pub async fn request_device_code(&self) -> Result<DeviceAuthorization, AuthError> {
        let auth = self
            .transport
            .request_device_code(&self.client_id, &self.scope)
            .await?;
        tracing::debug!(
            user_code = %auth.user_code,
            interval = auth.interval,
            expires_in = auth.expires_in,
            "Device code issued"
        );
        Ok(auth)
    }

    /// Poll until the server issues a token or ends the session.
    ///
    /// Each iteration waits the current interval before polling, so requests
    /// are never closer together than the most recently announced interval.
    /// `on_progress` is called after every non-terminal response.
    pub async fn poll_for_token<F>(
        &self,
        device_code: &str,
        initial_interval: Duration,
        mut on_progress: F,
    ) -> Result<Credential, AuthError>
    where
        F: FnMut(&PollProgress),
    {
        let mut poll = DevicePoll::new(initial_interval);

        loop {
            tokio::time::sleep(poll.interval()).await;

            let response = match self
                .transport
                .poll_token(&self.client_id, device_code)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    let err = poll.fail(e);
                    tracing::warn!(attempt = poll.attempts(), "Token poll failed: {err}");
                    return Err(err);
                }
            };

            match poll.apply(response) {
                None => {
                    tracing::debug!(
                        attempt = poll.attempts(),
                        state = ?poll.state(),
                        interval_secs = poll.interval().as_secs(),
                        "Authorization pending"
                    );
                    on_progress(&poll.progress());
                }
                Some(Ok(token)) => {
                    if token.access_token.is_empty() {
                        return Err(AuthError::Poll(
                            "server returned an empty access token".to_string(),
                        ));
                    }
                    tracing::info!(attempts = poll.attempts(), "Device authorization complete");
                    return Ok(token.into_credential(Utc::now()));
                }
                Some(Err(e)) => {
                    tracing::debug!(state = ?poll.state(), "Device authorization ended: {e}");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::{OAuthErrorBody, UserInfo};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    fn token(access: &str) -> PollResponse {
        PollResponse::Token(TokenResponse {
            access_token: access.to_string(),
            refresh_token: None,
            expires_in: Some(60),
            token_type: Some("Bearer".to_string()),
        })
    }

    /// Transport that replays scripted poll responses and records poll times.
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<PollResponse, AuthError>>>,
        polled_at: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<PollResponse, AuthError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                polled_at: Mutex::new(Vec::new()),
            }
        }

        fn poll_times(&self) -> Vec<Instant> {
            self.polled_at.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AuthTransport for ScriptedTransport {
        async fn request_device_code(
            &self,
            client_id: &str,
            scope: &str,
        ) -> Result<DeviceAuthorization, AuthError> {
            assert_eq!(client_id, "cli");
            assert_eq!(scope, "openid");
            Ok(DeviceAuthorization {
                device_code: "dev".to_string(),
                user_code: "ABCD-1234".to_string(),
                verification_uri: "https://example.com/device".to_string(),
                verification_uri_complete: None,
                interval: 5,
                expires_in: 600,
            })
        }

        async fn poll_token(
            &self,
            _client_id: &str,
            device_code: &str,
        ) -> Result<PollResponse, AuthError> {
            assert_eq!(device_code, "dev");
            self.polled_at.lock().unwrap().push(Instant::now());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("poll issued after the script ended")
        }

        async fn fetch_session(&self, _access_token: &str) -> Result<UserInfo, AuthError> {
            Ok(UserInfo::default())
        }
    }

    fn poller(responses: Vec<Result<PollResponse, AuthError>>) -> DeviceAuthPoller<ScriptedTransport> {
        DeviceAuthPoller::new(ScriptedTransport::new(responses), "cli", "openid")
    }

    fn gaps(times: &[Instant], start: Instant) -> Vec<Duration> {
        let mut prev = start;
        times
            .iter()
            .map(|t| {
                let gap = *t - prev;
                prev = *t;
                gap
            })
            .collect()
    }

    // ── State machine ──────────────────────────────────────────────────────

    #[test]
    fn test_pending_keeps_interval() {
        let mut poll = DevicePoll::new(Duration::from_secs(5));
        assert!(poll
            .apply(PollResponse::error("authorization_pending"))
            .is_none());
        assert_eq!(poll.state(), &PollState::Pending);
        assert_eq!(poll.interval(), Duration::from_secs(5));
        assert_eq!(poll.attempts(), 1);
    }

    #[test]
    fn test_slow_down_is_cumulative_and_never_resets() {
        let mut poll = DevicePoll::new(Duration::from_secs(5));
        assert!(poll.apply(PollResponse::error("slow_down")).is_none());
        assert_eq!(poll.interval(), Duration::from_secs(10));
        assert!(poll.apply(PollResponse::error("slow_down")).is_none());
        assert_eq!(poll.interval(), Duration::from_secs(15));
        assert!(poll
            .apply(PollResponse::error("authorization_pending"))
            .is_none());
        assert_eq!(poll.interval(), Duration::from_secs(15));
        assert_eq!(poll.state(), &PollState::SlowedDown);
    }

    #[test]
    fn test_access_denied_is_terminal() {
        let mut poll = DevicePoll::new(Duration::from_secs(5));
        let outcome = poll.apply(PollResponse::error("access_denied"));
        assert!(matches!(outcome, Some(Err(AuthError::AccessDenied))));
        assert_eq!(poll.state(), &PollState::Denied);
        assert!(poll.state().is_terminal());
    }

    #[test]
    fn test_expired_token_is_terminal() {
        let mut poll = DevicePoll::new(Duration::from_secs(5));
        let outcome = poll.apply(PollResponse::error("expired_token"));
        assert!(matches!(outcome, Some(Err(AuthError::Expired))));
        assert_eq!(poll.state(), &PollState::Expired);
    }

    #[test]
    fn test_unknown_error_carries_description() {
        let mut poll = DevicePoll::new(Duration::from_secs(5));
        let outcome = poll.apply(PollResponse::Error(OAuthErrorBody {
            error: "invalid_grant".to_string(),
            error_description: Some("device code unknown".to_string()),
        }));
        match outcome {
            Some(Err(AuthError::Poll(msg))) => assert_eq!(msg, "device code unknown"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(
            poll.state(),
            &PollState::Failed("device code unknown".to_string())
        );
    }

    #[test]
    fn test_unknown_error_without_description_uses_code() {
        let mut poll = DevicePoll::new(Duration::from_secs(5));
        match poll.apply(PollResponse::error("invalid_client")) {
            Some(Err(AuthError::Poll(msg))) => assert_eq!(msg, "invalid_client"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_token_finishes_session() {
        let mut poll = DevicePoll::new(Duration::from_secs(5));
        let outcome = poll.apply(token("abc"));
        assert!(matches!(outcome, Some(Ok(ref t)) if t.access_token == "abc"));
        assert_eq!(poll.state(), &PollState::Done);
    }

    #[test]
    fn test_apply_after_terminal_is_rejected() {
        let mut poll = DevicePoll::new(Duration::from_secs(5));
        let _ = poll.apply(PollResponse::error("access_denied"));
        assert!(matches!(
            poll.apply(token("late")),
            Some(Err(AuthError::Poll(_)))
        ));
        assert_eq!(poll.state(), &PollState::Denied);
    }

    // ── Driver loop ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_request_device_code_passes_client_and_scope() {
        let poller = poller(vec![]);
        let auth = poller.request_device_code().await.unwrap();
        assert_eq!(auth.user_code, "ABCD-1234");
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_returns_credential_after_pending() {
        let poller = poller(vec![
            Ok(PollResponse::error("authorization_pending")),
            Ok(PollResponse::error("authorization_pending")),
            Ok(token("abc")),
        ]);
        let start = Instant::now();
        let mut progress = Vec::new();

        let cred = poller
            .poll_for_token("dev", Duration::from_secs(5), |p| progress.push(p.clone()))
            .await
            .unwrap();

        assert_eq!(cred.access_token, "abc");
        assert!(cred.expires_at.is_some());
        let times = poller.transport().poll_times();
        assert_eq!(times.len(), 3);
        for gap in gaps(&times, start) {
            assert!(gap >= Duration::from_secs(5), "polled after {gap:?}");
        }
        assert_eq!(progress.len(), 2);
        assert_eq!(progress[1].attempt, 2);
        assert_eq!(progress[1].state, PollState::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_honours_slow_down() {
        let poller = poller(vec![
            Ok(PollResponse::error("slow_down")),
            Ok(PollResponse::error("slow_down")),
            Ok(PollResponse::error("authorization_pending")),
            Ok(token("abc")),
        ]);
        let start = Instant::now();

        poller
            .poll_for_token("dev", Duration::from_secs(5), |_| {})
            .await
            .unwrap();

        let gaps = gaps(&poller.transport().poll_times(), start);
        let expected = [5, 10, 15, 15].map(Duration::from_secs);
        assert_eq!(gaps.len(), expected.len());
        for (gap, min) in gaps.iter().zip(expected) {
            assert!(*gap >= min, "polled after {gap:?}, expected at least {min:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_access_denied_stops_polling() {
        let poller = poller(vec![
            Ok(PollResponse::error("authorization_pending")),
            Ok(PollResponse::error("access_denied")),
        ]);
        let err = poller
            .poll_for_token("dev", Duration::from_secs(5), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccessDenied));
        assert_eq!(poller.transport().poll_times().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_token_stops_polling() {
        let poller = poller(vec![Ok(PollResponse::error("expired_token"))]);
        let err = poller
            .poll_for_token("dev", Duration::from_secs(5), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Expired));
        assert_eq!(poller.transport().poll_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_is_not_retried() {
        let poller = poller(vec![Err(AuthError::Poll("connection reset".to_string()))]);
        let err = poller
            .poll_for_token("dev", Duration::from_secs(5), |_| {})
            .await
            .unwrap_err();
        match err {
            AuthError::Poll(msg) => assert_eq!(msg, "connection reset"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(poller.transport().poll_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_access_token_is_rejected() {
        let poller = poller(vec![Ok(token(""))]);
        let err = poller
            .poll_for_token("dev", Duration::from_secs(5), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Poll(_)));
    }
}
