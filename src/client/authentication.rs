use async_trait::async_trait;
use reqwest::Method;

use super::{
    RequestBuilder, TmdbClient, API_GUEST_SESSION_ENDPOINT, API_GUEST_SESSION_NEW_ENDPOINT, API_REQUEST_TOKEN_ENDPOINT,
    API_SESSION_ENDPOINT, API_SESSION_NEW_ENDPOINT,
};
use crate::{
    error::Result,
    model::authentication::{
        GuestSessionIdBody, NewGuestSession, NewSession, RequestToken, RequestTokenBody, SessionDeletion, SessionIdBody,
    },
};

/// The authentication endpoints. These are what the [session managers](crate::session) use to create and delete
/// sessions; you usually don't need to call them yourself.
///
/// [TmdbClient] implements this trait. The trait isn't sealed, so the session managers can be driven by a different
/// implementation, for example one that talks to a stub service.
#[async_trait]
pub trait AuthenticationClient: Send + Sync {
    /// Create a new request token that the user can approve.
    async fn create_request_token(&self) -> Result<RequestToken>;

    /// Exchange a request token the user has approved for a session.
    async fn create_session(&self, request_token: &str) -> Result<NewSession>;

    async fn delete_session(&self, session_id: &str) -> Result<SessionDeletion>;

    /// Create a guest session. Guest sessions don't require user approval.
    async fn create_guest_session(&self) -> Result<NewGuestSession>;

    async fn delete_guest_session(&self, guest_session_id: &str) -> Result<SessionDeletion>;
}

#[async_trait]
impl AuthenticationClient for TmdbClient {
    async fn create_request_token(&self) -> Result<RequestToken> {
        RequestBuilder::<_, RequestToken>::new(Method::GET, API_REQUEST_TOKEN_ENDPOINT, self.clone())
            .send_async()
            .await
    }

    async fn create_session(&self, request_token: &str) -> Result<NewSession> {
        RequestBuilder::<_, NewSession, _>::new_with_body(
            Method::POST,
            API_SESSION_NEW_ENDPOINT,
            RequestTokenBody { request_token },
            self.clone(),
        )
        .send_async()
        .await
    }

    async fn delete_session(&self, session_id: &str) -> Result<SessionDeletion> {
        RequestBuilder::<_, SessionDeletion, _>::new_with_body(
            Method::DELETE,
            API_SESSION_ENDPOINT,
            SessionIdBody { session_id },
            self.clone(),
        )
        .send_async()
        .await
    }

    async fn create_guest_session(&self) -> Result<NewGuestSession> {
        RequestBuilder::<_, NewGuestSession>::new(Method::GET, API_GUEST_SESSION_NEW_ENDPOINT, self.clone())
            .send_async()
            .await
    }

    async fn delete_guest_session(&self, guest_session_id: &str) -> Result<SessionDeletion> {
        RequestBuilder::<_, SessionDeletion, _>::new_with_body(
            Method::DELETE,
            API_GUEST_SESSION_ENDPOINT,
            GuestSessionIdBody { guest_session_id },
            self.clone(),
        )
        .send_async()
        .await
    }
}
