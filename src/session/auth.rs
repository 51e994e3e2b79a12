//! Login and logoff handshakes

use crate::browser::{DocumentClient, Fetcher};
use crate::portal::AuthProfile;
use crate::session::{LoginStatus, Session};
use crate::{Result, SigaaError};
use thiserror::Error;

/// Why the portal refused a login
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginFailure {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("portal served the login form again")]
    StillOnLoginSurface,

    #[error("student portal answered HTTP {0} after login")]
    ProbeUnauthorized(u16),
}

/// Classifies the document served right after submitting credentials
///
/// Returns `None` when nothing in the response indicates a failure.
pub fn classify_login_response(body: &str, auth: &AuthProfile) -> Option<LoginFailure> {
    if body.contains(auth.invalid_credentials_marker) {
        return Some(LoginFailure::InvalidCredentials);
    }
    if auth.login_surface_markers.iter().all(|m| body.contains(m)) {
        return Some(LoginFailure::StillOnLoginSurface);
    }
    None
}

/// Classifies the status of the post-login probe
pub fn classify_probe_status(status: u16) -> Option<LoginFailure> {
    match status {
        401 | 403 => Some(LoginFailure::ProbeUnauthorized(status)),
        _ => None,
    }
}

/// Turns an HTTP status error from a login step into an auth failure
fn rejected_status(step: &str, err: SigaaError) -> SigaaError {
    match err {
        SigaaError::HttpStatus { status, .. } => {
            SigaaError::Authentication(format!("{} answered HTTP {}", step, status))
        }
        other => other,
    }
}

/// Runs the login handshake
///
/// Does nothing (and sends nothing) when the session is already
/// authenticated. On any failure the session stays unauthenticated.
pub async fn login<F: Fetcher>(
    session: &mut Session,
    doc: &mut DocumentClient<F>,
    auth: &AuthProfile,
    username: &str,
    password: &str,
) -> Result<()> {
    if session.is_authenticated() {
        tracing::debug!("Already authenticated, skipping login");
        return Ok(());
    }

    tracing::info!("Logging in to {} as {}", session.institution(), username);

    doc.navigate(auth.login_path)
        .await
        .map_err(|e| rejected_status("login page", e))?;

    let fields = vec![
        (auth.user_field.to_string(), username.to_string()),
        (auth.password_field.to_string(), password.to_string()),
        (auth.submit_field.to_string(), auth.submit_value.to_string()),
    ];

    doc.submit_form(auth.login_path, &fields)
        .await
        .map_err(|e| rejected_status("login submission", e))?;

    if let Some(failure) = classify_login_response(doc.content(), auth) {
        tracing::warn!("Login rejected: {}", failure);
        return Err(SigaaError::Authentication(failure.to_string()));
    }

    let status = doc.probe(auth.probe_path).await?;
    if let Some(failure) = classify_probe_status(status) {
        tracing::warn!("Login rejected: {}", failure);
        return Err(SigaaError::Authentication(failure.to_string()));
    }

    session.transition(LoginStatus::Authenticated)?;
    tracing::info!("Authenticated");
    Ok(())
}

/// Ends the portal session
///
/// A no-op when not authenticated. Any 2xx or 3xx answer counts as success.
pub async fn logoff<F: Fetcher>(
    session: &mut Session,
    doc: &mut DocumentClient<F>,
    auth: &AuthProfile,
) -> Result<()> {
    if !session.is_authenticated() {
        return Ok(());
    }

    let status = doc.probe(auth.logoff_path).await?;
    if !(200..400).contains(&status) {
        return Err(SigaaError::Authentication(format!(
            "logoff answered HTTP {}",
            status
        )));
    }

    session.transition(LoginStatus::Unauthenticated)?;
    tracing::info!("Logged off");
    Ok(())
}
