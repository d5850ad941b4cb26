//! Contains the [TmdbClient] and its builder, and the traits that implement the service's endpoints.
//!
//! # Usage
//!
//! Every request to the API is authenticated with an API read access token. A new client is built with it:
//!
//! ```no_run
//! # use ferritmdb::{client::TmdbClientBuilder, prelude::*};
//! # async fn foo() {
//! let tmdb_client = TmdbClientBuilder::new("API read access token")
//!     .build()
//!     .expect("failed to build TMDB client");
//!
//! // all unscoped endpoints are available right away
//! let movie = tmdb_client.movie(550).language("en-US").send_async().await.unwrap();
//! println!("{}", movie.title());
//! # }
//! ```
//!
//! Endpoints that act on behalf of a user require a session identifier, which is acquired through the interactive
//! flow in the [session module](crate::session).

pub(crate) mod authentication;
pub(crate) mod private;
pub mod request_builder;
pub(crate) mod scoped;
pub(crate) mod unscoped;

pub use self::{
    authentication::AuthenticationClient,
    request_builder::RequestBuilder,
    scoped::{ScopedClient, SessionRef},
    unscoped::UnscopedClient,
};

use std::{sync::Arc, time::Duration};

use const_format::concatcp;
use log::debug;
use reqwest::{header, Method, Url};

use crate::error::{Error, Result};

const API_BASE_URL: &str = "https://api.themoviedb.org/3/";
const USER_AGENT: &str = concatcp!("ferritmdb/", env!("CARGO_PKG_VERSION"));

/// The page the user is sent to in order to approve a request token.
pub(crate) const AUTHENTICATE_URL: &str = "https://www.themoviedb.org/authenticate/";

// authentication endpoints
const API_REQUEST_TOKEN_ENDPOINT: &str = "authentication/token/new";
const API_SESSION_NEW_ENDPOINT: &str = "authentication/session/new";
const API_SESSION_ENDPOINT: &str = "authentication/session";
const API_GUEST_SESSION_NEW_ENDPOINT: &str = "authentication/guest_session/new";
const API_GUEST_SESSION_ENDPOINT: &str = "authentication/guest_session";

// unscoped endpoints
const API_MOVIE_ENDPOINT: &str = "movie";
const API_SEARCH_MOVIE_ENDPOINT: &str = "search/movie";

// scoped endpoints
const API_ACCOUNT_ENDPOINT: &str = "account";

/// A client for the TMDB API, authenticated with an API read access token.
///
/// Implements the [authentication](AuthenticationClient), [unscoped](UnscopedClient) and [scoped](ScopedClient)
/// endpoints. The client uses `Arc` internally, so it is cheap to clone and you do not need to wrap it in an `Arc` in
/// order to share it.
#[derive(Debug, Clone)]
pub struct TmdbClient {
    inner: Arc<TmdbClientRef>,
    http_client: reqwest::Client,
}

#[derive(Debug)]
struct TmdbClientRef {
    read_access_token: String,
    api_base_url: Url,
}

/// Builder for [TmdbClient].
#[derive(Debug, Clone)]
pub struct TmdbClientBuilder {
    read_access_token: String,
    api_base_url: Option<String>,
    timeout: Option<Duration>,
}

impl TmdbClientBuilder {
    pub fn new<S>(read_access_token: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            read_access_token: read_access_token.into(),
            api_base_url: None,
            timeout: None,
        }
    }

    /// Override the base URL endpoint paths are resolved against. Defaults to `https://api.themoviedb.org/3/`.
    pub fn api_base_url<S>(self, api_base_url: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            api_base_url: Some(api_base_url.into()),
            ..self
        }
    }

    /// Set a timeout for each request, from connecting until the response body has been read. No timeout by default.
    pub fn timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    pub fn build(self) -> Result<TmdbClient> {
        let api_base_url = parse_base_url(self.api_base_url.as_deref().unwrap_or(API_BASE_URL))?;
        debug!("Building TMDB client for {}", api_base_url);

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(default_headers);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let http_client = builder.build().map_err(Error::transport)?;

        Ok(TmdbClient {
            inner: Arc::new(TmdbClientRef {
                read_access_token: self.read_access_token,
                api_base_url,
            }),
            http_client,
        })
    }
}

impl crate::private::Sealed for TmdbClient {}

impl private::BuildHttpRequest for TmdbClient {
    fn build_http_request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, url)
            .bearer_auth(self.inner.read_access_token.as_str())
    }

    fn api_base_url(&self) -> &Url {
        &self.inner.api_base_url
    }
}

impl UnscopedClient for TmdbClient {}

impl ScopedClient for TmdbClient {}

/// Endpoint paths are joined onto the base URL, so it has to end in a slash or the last path segment would be replaced.
fn parse_base_url(base_url: &str) -> Result<Url> {
    let base_url = if base_url.ends_with('/') {
        base_url.to_owned()
    } else {
        format!("{base_url}/")
    };

    Url::parse(&base_url)
        .map_err(|err| Error::InvalidArgument(format!("invalid API base URL {base_url:?}: {err}").into()))
}
