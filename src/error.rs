use std::{borrow::Cow, time::Duration};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The interactive session flow, or creating or deleting a session, failed. The underlying cause, if any, is
    /// available through [source](std::error::Error::source).
    #[error("{message}")]
    Session {
        message: Cow<'static, str>,
        #[source]
        source: Option<BoxError>,
    },

    /// The service rejected the request with a 4xx status (other than 429), or the request couldn't be sent at all.
    #[error("{}", describe_request_error(.status, .message))]
    Request {
        status: Option<u16>,
        message: Option<String>,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request rate limit hit; retry after {retry_after} seconds")]
    Throttled { retry_after: u64 },

    /// The service failed to handle the request (5xx), or responded with a status the library doesn't expect.
    #[error("{}", describe_response_error(.status, .message))]
    Response { status: u16, message: Option<String> },

    /// A response body was received but it couldn't be decompressed or deserialized into the expected type.
    #[error("Failed to parse the response body")]
    ResponseParse(#[source] BoxError),

    #[error("Invalid grant receiver port {0:?}; expected a port between 1 and 65535")]
    InvalidPort(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(Cow<'static, str>),
}

impl Error {
    pub(crate) fn session<S>(message: S) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        Self::Session {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn session_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<Cow<'static, str>>,
        E: Into<BoxError>,
    {
        Self::Session {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub(crate) fn transport(source: reqwest::Error) -> Self {
        Self::Request {
            status: None,
            message: None,
            source: Some(source),
        }
    }

    /// Returns how long the service asked to wait before retrying, if this is a [Throttled](Error::Throttled) error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Throttled { retry_after } => Some(Duration::from_secs(*retry_after)),
            _ => None,
        }
    }

    /// Returns the HTTP status code the service responded with, if the error was caused by a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => *status,
            Self::Throttled { .. } => Some(429),
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn describe_request_error(status: &Option<u16>, message: &Option<String>) -> String {
    match (status, message) {
        (Some(status), Some(message)) => format!("The request was rejected with status {status}: {message}"),
        (Some(status), None) => format!("The request was rejected with status {status}"),
        (None, _) => String::from("Failed to send the request"),
    }
}

fn describe_response_error(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => format!("The service failed to handle the request with status {status}: {message}"),
        None => format!("The service failed to handle the request with status {status}"),
    }
}
