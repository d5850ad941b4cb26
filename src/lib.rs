//! A wrapper for The Movie Database (TMDB) API, including the interactive flow for acquiring a user session.
//!
//! The [TmdbClient](client::TmdbClient) authenticates every request with an API read access token and exposes the
//! endpoints through the traits in the [prelude]. Endpoints that act on behalf of a user need a session identifier,
//! which the [SessionManager](session::SessionManager) acquires by sending the user to TMDB's consent page and
//! catching the approval redirect on a local listener. Guest sessions are created without any user interaction by the
//! [GuestSessionManager](session::GuestSessionManager).
//!
//! ```no_run
//! # use ferritmdb::{client::TmdbClientBuilder, prelude::*, session::SessionManager};
//! # async fn foo() -> ferritmdb::Result<()> {
//! let tmdb_client = TmdbClientBuilder::new("API read access token").build()?;
//! let session_manager = SessionManager::new(tmdb_client.clone());
//!
//! // opens the consent page in the user's browser and waits until they approve or deny the request
//! let session_id = session_manager.register_new_session().await?;
//!
//! let account = tmdb_client.account_details(&session_id).send_async().await?;
//! println!("Hello {}", account.username());
//! # Ok(())
//! # }
//! ```
//!
//! # Crate features
//!
//! - `native-tls` (default): use the system's native TLS implementation.
//! - `rustls-tls`: use `rustls` as the TLS implementation instead.

pub mod client;
pub mod error;
pub mod model;
pub mod session;

pub use crate::error::{Error, Result};

/// Contains all the endpoint traits and the traits for the model's common fields.
pub mod prelude {
    pub use crate::{
        client::{AuthenticationClient, ScopedClient, UnscopedClient},
        model::movie::CommonMovieInformation,
    };
}

mod private {
    pub trait Sealed {}
}
