use reqwest::{Method, Url};

use crate::error::{Error, Result};

/// Every TMDB client implements this trait.
pub trait BuildHttpRequest: crate::private::Sealed {
    /// Returns a new [RequestBuilder](reqwest::RequestBuilder) for an endpoint with any necessary information (e.g.
    /// the authentication header) filled in. You probably shouldn't call this function directly; instead use the
    /// [request builder](crate::client::request_builder::RequestBuilder) the endpoint functions return.
    fn build_http_request(&self, method: Method, url: Url) -> reqwest::RequestBuilder;

    /// Returns the base URL the endpoint paths are joined onto.
    fn api_base_url(&self) -> &Url;

    /// Resolves an endpoint path relative to the API base URL.
    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        self.api_base_url()
            .join(endpoint)
            .map_err(|err| Error::InvalidArgument(format!("invalid endpoint path {endpoint:?}: {err}").into()))
    }
}
