//! Login state tracking for one portal session
//!
//! The session only changes state through [`Session::transition`], which
//! rejects moves the auth handshake never makes.
use crate::{Result, SigaaError};
use std::fmt;

/// Where the portal session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginStatus {
    /// No usable portal session; data calls are refused
    Unauthenticated,

    /// Credentials accepted and the student portal answered
    Authenticated,
}

impl LoginStatus {
    /// Returns true if moving from `self` to `to` is a real transition
    pub fn can_transition_to(&self, to: LoginStatus) -> bool {
        matches!(
            (self, to),
            (Self::Unauthenticated, Self::Authenticated) | (Self::Authenticated, Self::Unauthenticated)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
        }
    }

}

impl fmt::Display for LoginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication state of one client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    institution: String,
    status: LoginStatus,
}

impl Session {
    pub fn new(institution: &str) -> Self {
        Self {
            institution: institution.to_string(),
            status: LoginStatus::Unauthenticated,
        }
    }

    pub fn institution(&self) -> &str {
        &self.institution
    }

    pub fn status(&self) -> LoginStatus {
        self.status
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == LoginStatus::Authenticated
    }

    /// Guard run before any data request
    pub fn require_authenticated(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(SigaaError::NotAuthenticated)
        }
    }

    pub fn transition(&mut self, to: LoginStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(SigaaError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        tracing::debug!("Session {}: {} -> {}", self.institution, self.status, to);
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_unauthenticated() {
        let session = Session::new("UFBA");
        assert_eq!(session.status(), LoginStatus::Unauthenticated);
        assert!(matches!(
            session.require_authenticated(),
            Err(SigaaError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_transitions() {
        let mut session = Session::new("UFBA");

        session.transition(LoginStatus::Authenticated).unwrap();
        assert!(session.require_authenticated().is_ok());

        let err = session.transition(LoginStatus::Authenticated).unwrap_err();
        assert!(matches!(err, SigaaError::InvalidTransition { .. }));

        session.transition(LoginStatus::Unauthenticated).unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(LoginStatus::Authenticated.to_string(), "authenticated");
        assert_eq!(LoginStatus::Unauthenticated.to_string(), "unauthenticated");
    }
}
