//! The `lumen login`, `lumen logout` and `lumen whoami` commands.

use std::time::Duration;

use console::style;
use lumen_core::auth::{AuthTransport, HttpAuthTransport, PollProgress, PollState};
use lumen_core::{Credential, Session};

use super::theme;

/// Run the device-authorization flow and store the resulting credential.
pub async fn login(session: &Session) -> anyhow::Result<()> {
    if let Some(existing) = stored_credential(session) {
        let prompt = format!(
            "Already logged in as {}. Log in again?",
            existing.display_name()
        );
        if !theme::confirm(&prompt)? {
            println!("Keeping existing login as {}.", existing.display_name());
            return Ok(());
        }
    }

    let poller = session.device_poller();
    let authorization = poller.request_device_code().await?;

    eprintln!();
    eprintln!(
        "  Open {} and enter the code:",
        style(&authorization.verification_uri).for_stderr().cyan().underlined()
    );
    eprintln!();
    eprintln!(
        "      {}",
        style(&authorization.user_code).for_stderr().bold().yellow()
    );
    if let Some(complete) = &authorization.verification_uri_complete {
        eprintln!();
        eprintln!(
            "  Or visit {} directly.",
            style(complete).for_stderr().cyan()
        );
    }
    eprintln!();
    eprintln!(
        "  {}",
        style(format!(
            "The code expires in {} minutes.",
            authorization.expires_in.div_ceil(60)
        ))
        .for_stderr()
        .dim()
    );
    eprintln!();

    let spinner = theme::spinner("Waiting for authorization...");
    let result = poller
        .poll_for_token(
            &authorization.device_code,
            Duration::from_secs(authorization.interval),
            |progress: &PollProgress| {
                if progress.state == PollState::SlowedDown {
                    spinner.set_message(format!(
                        "Waiting for authorization (polling every {}s)...",
                        progress.interval.as_secs()
                    ));
                }
            },
        )
        .await;
    spinner.finish_and_clear();
    let mut credential = result?;

    match poller
        .transport()
        .fetch_session(&credential.access_token)
        .await
    {
        Ok(user) => credential.user = Some(user),
        Err(e) => tracing::warn!("Logged in, but could not fetch profile: {e}"),
    }

    session.store().save(&credential)?;
    tracing::debug!(path = %session.store().path().display(), "Credential saved");
    theme::success(&format!("Logged in as {}", credential.display_name()));
    Ok(())
}

/// The current credential, if one can be read.
///
/// An unreadable credential file is overwritten by the new login.
fn stored_credential(session: &Session) -> Option<Credential> {
    match session.store().load() {
        Ok(credential) => credential,
        Err(e) => {
            tracing::warn!(
                path = %session.store().path().display(),
                "Ignoring unreadable credential file: {e}"
            );
            None
        }
    }
}

/// Remove the stored credential.
pub async fn logout(session: &Session) -> anyhow::Result<()> {
    if session.store().clear()? {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

/// Show the account behind the stored token, refreshing the cached profile.
pub async fn whoami(session: &Session) -> anyhow::Result<()> {
    let mut credential = session.credential()?;

    let transport = HttpAuthTransport::new(&session.config().auth);
    let user = transport.fetch_session(&credential.access_token).await?;

    let changed = credential.user.as_ref() != Some(&user);
    credential.user = Some(user);
    println!("{}", credential.display_name());

    if changed {
        session.store().save(&credential)?;
    }
    Ok(())
}
