use reqwest::Method;
use serde::Serialize;

use super::{private::BuildHttpRequest, RequestBuilder, API_ACCOUNT_ENDPOINT, API_MOVIE_ENDPOINT};
use crate::model::{account::AccountDetails, status::StatusResponse};

const SESSION_ID_QUERY: &str = "session_id";
const GUEST_SESSION_ID_QUERY: &str = "guest_session_id";

/// A session to act on behalf of, as handed out by the [session managers](crate::session).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRef<'a> {
    /// A session the user approved through the [SessionManager](crate::session::SessionManager).
    User(&'a str),
    /// A session from the [GuestSessionManager](crate::session::GuestSessionManager).
    Guest(&'a str),
}

#[derive(Debug, Serialize)]
pub struct RatingBody {
    value: f32,
}

/// All endpoints that act on behalf of a user session. [TmdbClient] implements this trait.
///
/// [TmdbClient]: super::TmdbClient
pub trait ScopedClient
where
    Self: BuildHttpRequest + Clone + Sized,
{
    /// Get the details of the account the given user session belongs to.
    fn account_details(&self, session_id: &str) -> RequestBuilder<Self, AccountDetails> {
        RequestBuilder::new(Method::GET, API_ACCOUNT_ENDPOINT, self.clone())
            .append_query(SESSION_ID_QUERY, session_id.to_owned())
    }

    /// Rate a movie on behalf of a user or a guest session. The rating is between 0.5 and 10.0, in steps of 0.5; the
    /// service rejects anything else with a 400 [Request-error](crate::error::Error::Request).
    fn rate_movie(
        &self,
        movie_id: u64,
        rating: f32,
        session: SessionRef<'_>,
    ) -> RequestBuilder<Self, StatusResponse, RatingBody> {
        let builder = RequestBuilder::new_with_body(
            Method::POST,
            format!("{}/{}/rating", API_MOVIE_ENDPOINT, movie_id),
            RatingBody { value: rating },
            self.clone(),
        );

        match session {
            SessionRef::User(session_id) => builder.append_query(SESSION_ID_QUERY, session_id.to_owned()),
            SessionRef::Guest(guest_session_id) => {
                builder.append_query(GUEST_SESSION_ID_QUERY, guest_session_id.to_owned())
            }
        }
    }
}
