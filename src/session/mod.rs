//! Session and authentication state machine

mod auth;
mod state;

pub use auth::{classify_login_response, classify_probe_status, login, logoff, LoginFailure};
pub use state::{LoginStatus, Session};
