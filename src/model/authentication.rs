//! Response and request bodies of the authentication endpoints.
//!
//! These are what the [AuthenticationClient](crate::client::AuthenticationClient) returns. Most users don't need to
//! handle them directly; the [session managers](crate::session) drive the endpoints and keep only the identifiers.

use serde::{Deserialize, Serialize};

/// A short-lived request token. It has to be approved by the user before it can be exchanged for a session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestToken {
    pub success: bool,
    /// When the token expires, as formatted by the service (e.g. `2016-08-26 17:04:39 UTC`).
    pub expires_at: Option<String>,
    pub request_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewSession {
    pub success: bool,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewGuestSession {
    pub success: bool,
    pub guest_session_id: Option<String>,
    pub expires_at: Option<String>,
}

/// Result of deleting a session or a guest session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionDeletion {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestTokenBody<'a> {
    pub request_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionIdBody<'a> {
    pub session_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct GuestSessionIdBody<'a> {
    pub guest_session_id: &'a str,
}
