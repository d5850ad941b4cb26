//! The request builder every endpoint function returns, and the execution layer that sends the request and turns the
//! response into either a parsed result or a typed [Error].
//!
//! Responses are classified by their status code:
//!
//! - 2xx: the body is decompressed if the response says it is gzip-encoded, and deserialized into the endpoint's
//!   result type. Failure to do either is an [ResponseParse-error](Error::ResponseParse).
//! - 429: a [Throttled-error](Error::Throttled) with the wait time from the `Retry-After` header, or 10 seconds if the
//!   header is missing or invalid.
//! - other 4xx: a [Request-error](Error::Request).
//! - 5xx and anything else: a [Response-error](Error::Response).
//!
//! Failing to send the request at all is also a [Request-error](Error::Request), with the transport error as its
//! source.

use std::{borrow::Cow, fmt::Debug, io::Read, marker::PhantomData};

use flate2::read::GzDecoder;
use log::{debug, error, trace, warn};
use reqwest::{
    header::{self, HeaderMap},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};

use super::private::BuildHttpRequest;
use crate::{
    error::{Error, Result},
    model::{movie::MovieSummary, page::Page, status::StatusResponse},
};

/// How long to wait after a rate-limit response that doesn't say how long to wait.
pub(crate) const DEFAULT_RETRY_AFTER_SECONDS: u64 = 10;

const LANGUAGE_QUERY: &str = "language";
const PAGE_QUERY: &str = "page";
const YEAR_QUERY: &str = "year";
const INCLUDE_ADULT_QUERY: &str = "include_adult";

/// Classification of a response based on its status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    /// Rate limited; retry after the given amount of seconds.
    Throttled(u64),
    ClientError,
    ServerError,
}

impl ResponseClass {
    pub fn classify(status: StatusCode, headers: &HeaderMap) -> Self {
        if status.is_success() {
            Self::Success
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Self::Throttled(extract_retry_after(headers))
        } else if status.is_client_error() {
            Self::ClientError
        } else {
            // 5xx, and whatever 1xx or 3xx the HTTP client didn't handle itself
            Self::ServerError
        }
    }
}

/// A request to a single endpoint. Endpoint-specific options are available as functions on the builder; the request is
/// sent with [send_async](RequestBuilder::send_async).
pub struct RequestBuilder<TClient, TReturn, TBody = ()> {
    client: TClient,
    method: Method,
    endpoint: Cow<'static, str>,
    query_params: Vec<(&'static str, Cow<'static, str>)>,
    body: Option<TBody>,

    return_phantom: PhantomData<fn() -> TReturn>,
}

impl<TClient, TReturn, TBody> RequestBuilder<TClient, TReturn, TBody> {
    pub(crate) fn new<S>(method: Method, endpoint: S, client: TClient) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        Self {
            client,
            method,
            endpoint: endpoint.into(),
            query_params: Vec::new(),
            body: None,

            return_phantom: PhantomData,
        }
    }

    pub(crate) fn new_with_body<S>(method: Method, endpoint: S, body: TBody, client: TClient) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        Self {
            body: Some(body),
            ..Self::new(method, endpoint, client)
        }
    }

    pub(crate) fn append_query<S>(mut self, key: &'static str, value: S) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        self.query_params.push((key, value.into()));
        self
    }

    /// The language to return translated fields in, as an ISO 639-1 code optionally followed by an ISO 3166-1 region
    /// (e.g. `en-US`). The service defaults to `en-US`.
    pub fn language<S>(self, language: S) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        self.append_query(LANGUAGE_QUERY, language)
    }
}

impl<TClient, TReturn, TBody> RequestBuilder<TClient, TReturn, TBody>
where
    TClient: BuildHttpRequest + Send + Sync,
    TReturn: DeserializeOwned,
    TBody: Debug + Serialize + Send + Sync,
{
    /// Send the request and parse the response.
    pub async fn send_async(self) -> Result<TReturn> {
        let url = self.client.endpoint_url(&self.endpoint)?;
        debug!("Sending {} request to {}", self.method, url);

        let mut request = self.client.build_http_request(self.method.clone(), url);

        if !self.query_params.is_empty() {
            trace!("Query: {:?}", self.query_params);
            request = request.query(&self.query_params);
        }

        if let Some(body) = &self.body {
            trace!("Request body: {:?}", body);
            request = request.json(body);
        }

        execute(request).await
    }
}

impl<TClient> RequestBuilder<TClient, Page<MovieSummary>> {
    /// Which page of results to return, starting from 1.
    pub fn page(self, page: u32) -> Self {
        self.append_query(PAGE_QUERY, page.to_string())
    }

    /// Only return movies released in the given year.
    pub fn year(self, year: u16) -> Self {
        self.append_query(YEAR_QUERY, year.to_string())
    }

    /// Whether or not to include adult titles in the results. The service defaults to `false`.
    pub fn include_adult(self, include_adult: bool) -> Self {
        self.append_query(INCLUDE_ADULT_QUERY, include_adult.to_string())
    }
}

/// Sends a request and classifies its response. Transport errors never escape as-is; every failure is one of the typed
/// errors described in the [module documentation](self).
pub(crate) async fn execute<T>(request: reqwest::RequestBuilder) -> Result<T>
where
    T: DeserializeOwned,
{
    let response = request.send().await.map_err(|err| {
        error!("Failed to send request: {}", err);
        Error::transport(err)
    })?;

    let status = response.status();
    let class = ResponseClass::classify(status, response.headers());
    trace!("Got {} response classified as {:?}", status, class);

    match class {
        ResponseClass::Success => {
            let gzipped = is_gzip_encoded(response.headers());
            let body = response.bytes().await.map_err(Error::transport)?;
            parse_body(&body, gzipped)
        }

        ResponseClass::Throttled(retry_after) => Err(Error::Throttled { retry_after }),

        ResponseClass::ClientError => {
            error!("Got {} response", status);
            let message = read_status_message(response).await;

            Err(Error::Request {
                status: Some(status.as_u16()),
                message,
                source: None,
            })
        }

        ResponseClass::ServerError => {
            error!("Got {} response", status);
            let message = read_status_message(response).await;

            Err(Error::Response {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Decompresses the body if needed and deserializes it.
pub(crate) fn parse_body<T>(body: &[u8], gzipped: bool) -> Result<T>
where
    T: DeserializeOwned,
{
    let body = decode_body(body, gzipped).map_err(|err| {
        error!("Failed to decompress gzip-encoded response body: {}", err);
        Error::ResponseParse(Box::new(err))
    })?;

    trace!("Body: {}", String::from_utf8_lossy(&body));

    serde_json::from_slice(&body).map_err(|err| {
        error!("Failed to parse response body: {}", err);
        Error::ResponseParse(Box::new(err))
    })
}

fn decode_body(body: &[u8], gzipped: bool) -> std::io::Result<Cow<'_, [u8]>> {
    if !gzipped {
        return Ok(Cow::Borrowed(body));
    }

    let mut decompressed = Vec::new();
    GzDecoder::new(body).read_to_end(&mut decompressed)?;
    trace!("Decompressed response body: {} -> {} bytes", body.len(), decompressed.len());

    Ok(Cow::Owned(decompressed))
}

fn is_gzip_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_ENCODING)
        .and_then(|header| header.to_str().ok())
        .map(|encodings| {
            encodings
                .split(',')
                .any(|encoding| encoding.trim().eq_ignore_ascii_case("gzip"))
        })
        .unwrap_or(false)
}

fn extract_retry_after(headers: &HeaderMap) -> u64 {
    if let Some(wait_time) = headers
        .get(header::RETRY_AFTER)
        .and_then(|header| header.to_str().ok())
        .and_then(|header_str| header_str.trim().parse::<u64>().ok())
    {
        warn!("Got 429 rate-limit response with Retry-After: {}", wait_time);
        wait_time
    } else {
        warn!(
            "Got 429 rate-limit response without a valid Retry-After header, assuming {} seconds",
            DEFAULT_RETRY_AFTER_SECONDS
        );

        DEFAULT_RETRY_AFTER_SECONDS
    }
}

/// Error bodies are informational only, so anything that goes wrong reading them is ignored.
async fn read_status_message(response: reqwest::Response) -> Option<String> {
    let gzipped = is_gzip_encoded(response.headers());
    let body = response.bytes().await.ok()?;
    let body = decode_body(&body, gzipped).ok()?;

    let status = StatusResponse::from_error_body(&body)?;
    warn!("Error response: {} ({})", status.status_message, status.status_code);

    Some(status.status_message)
}
