//! The handler for the single redirect the consent page sends back to the local grant receiver.

use std::{
    borrow::Cow,
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use log::{debug, trace, warn};
use tokio::sync::Semaphore;

use crate::error::{Error, Result};

const APPROVED_QUERY: &str = "approved";
const DENIED_QUERY: &str = "denied";

const APPROVED_PAGE_FILE: &str = "approved.html";
const FAILURE_PAGE_FILE: &str = "failure.html";

const APPROVED_PAGE: &str = "<!DOCTYPE html><html><head><title>Authentication approved</title></head>\
<body><h1>Authentication approved</h1><p>You may close this window and return to the application.</p></body></html>";

const FAILURE_PAGE: &str = "<!DOCTYPE html><html><head><title>Authentication failed</title></head>\
<body><h1>Authentication failed</h1><p>The request was denied. You may close this window.</p></body></html>";

/// Turns the consent page's redirect into an approval status and releases whoever is waiting for it.
///
/// The gate is a semaphore without permits. Every handled request and every explicit release adds one permit, so a
/// release that happens before anyone waits isn't lost.
///
/// The gate is released when the handler returns, before the response reaches the browser. A waiter may therefore
/// stop the receiver while the landing page is still being written; the receiver's graceful shutdown lets that
/// response finish.
#[derive(Debug)]
pub(crate) struct GrantListener {
    callback_path: String,
    success_landing_page_url: Option<String>,
    failure_landing_page_url: Option<String>,
    landing_page_dir: Option<PathBuf>,

    approval_status: Mutex<Option<bool>>,
    gate: Semaphore,
}

/// Releases the gate when dropped, including when the handler panics.
struct ReleaseGuard<'a>(&'a GrantListener);

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        self.0.release();
    }
}

impl GrantListener {
    pub(crate) fn new(
        callback_path: String,
        success_landing_page_url: Option<String>,
        failure_landing_page_url: Option<String>,
        landing_page_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            callback_path,
            success_landing_page_url,
            failure_landing_page_url,
            landing_page_dir,

            approval_status: Mutex::new(None),
            gate: Semaphore::new(0),
        }
    }

    pub(crate) fn approval_status(&self) -> Option<bool> {
        *self.approval_status.lock().expect("approval status mutex poisoned")
    }

    pub(crate) fn release(&self) {
        trace!("Releasing approval status waiter");
        self.gate.add_permits(1);
    }

    /// Waits until a callback has been handled or the listener has been released, and returns the approval status.
    pub(crate) async fn wait_for_approval_status(&self) -> Result<bool> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|err| Error::session_with_source("No auth callback received", err))?;

        permit.forget();

        self.approval_status()
            .ok_or_else(|| Error::session("No auth callback received"))
    }

    pub(crate) fn handle_request(&self, uri: &Uri) -> Response {
        let _release = ReleaseGuard(self);

        if uri.path() != self.callback_path {
            warn!("Ignoring request to {} on the grant receiver", uri.path());
            return (StatusCode::NOT_FOUND, [(header::CONNECTION, "close")]).into_response();
        }

        let params = parse_query(uri.query().unwrap_or_default());
        let approved = flag(&params, APPROVED_QUERY) && !flag(&params, DENIED_QUERY);
        debug!("Received auth callback, approved: {}", approved);

        *self.approval_status.lock().expect("approval status mutex poisoned") = Some(approved);

        self.landing_response(approved)
    }

    fn landing_response(&self, approved: bool) -> Response {
        let landing_page_url = if approved {
            self.success_landing_page_url.as_deref()
        } else {
            self.failure_landing_page_url.as_deref()
        };

        if let Some(url) = landing_page_url {
            debug!("Redirecting to landing page {}", url);

            // a 302 specifically; axum's Redirect only offers 303, 307 and 308
            return (
                StatusCode::FOUND,
                [(header::LOCATION, url.to_owned()), (header::CONNECTION, String::from("close"))],
            )
                .into_response();
        }

        (
            StatusCode::OK,
            [(header::CONNECTION, "close")],
            Html(self.landing_page(approved).into_owned()),
        )
            .into_response()
    }

    fn landing_page(&self, approved: bool) -> Cow<'static, str> {
        let (file_name, inline_page) = if approved {
            (APPROVED_PAGE_FILE, APPROVED_PAGE)
        } else {
            (FAILURE_PAGE_FILE, FAILURE_PAGE)
        };

        if let Some(dir) = &self.landing_page_dir {
            let path = dir.join(file_name);

            match std::fs::read_to_string(&path) {
                Ok(page) => return Cow::Owned(page),
                Err(err) => warn!("Failed to read landing page {}: {}", path.display(), err),
            }
        }

        Cow::Borrowed(inline_page)
    }
}

pub(crate) async fn handle_callback(State(listener): State<Arc<GrantListener>>, uri: Uri) -> Response {
    listener.handle_request(&uri)
}

/// Splits a query string into a flat map. A pair is split on every `=`; a key with no value or more than one `=` maps
/// to an empty string. Percent-decoding is lenient: anything that doesn't decode into UTF-8 is kept as-is.
pub(crate) fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let parts: Vec<&str> = pair.split('=').collect();
            let value = if parts.len() == 2 {
                decode_lenient(parts[1])
            } else {
                String::new()
            };

            (decode_lenient(parts[0]), value)
        })
        .collect()
}

fn decode_lenient(component: &str) -> String {
    urlencoding::decode(component)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| component.to_owned())
}

fn flag(params: &HashMap<String, String>, name: &str) -> bool {
    params
        .get(name)
        .map(|value| value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn listener() -> GrantListener {
        GrantListener::new(String::from("/Approved"), None, None, None)
    }

    fn callback(query: &str) -> Uri {
        format!("/Approved?{}", query).parse().unwrap()
    }

    #[test]
    fn query_pairs() {
        let params = parse_query("approved=true&denied=false");

        assert_eq!(params.get("approved").map(String::as_str), Some("true"));
        assert_eq!(params.get("denied").map(String::as_str), Some("false"));
    }

    #[test]
    fn malformed_pairs_map_to_empty_values() {
        let params = parse_query("approved&denied=true=extra&&request_token=abc%20def");

        assert_eq!(params.get("approved").map(String::as_str), Some(""));
        assert_eq!(params.get("denied").map(String::as_str), Some(""));
        assert_eq!(params.get("request_token").map(String::as_str), Some("abc def"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn invalid_percent_encoding_is_kept() {
        let params = parse_query("approved=%FF");
        assert_eq!(params.get("approved").map(String::as_str), Some("%FF"));
    }

    #[test]
    fn flags_are_case_insensitive() {
        let params = parse_query("approved=TRUE&denied=False");

        assert!(flag(&params, "approved"));
        assert!(!flag(&params, "denied"));
        assert!(!flag(&params, "missing"));
    }

    #[test]
    fn approval_requires_approved_and_not_denied() {
        for (query, expected) in [
            ("approved=true", true),
            ("approved=true&denied=false", true),
            ("approved=true&denied=true", false),
            ("denied=true", false),
            ("", false),
            ("approved=yes", false),
            ("approved=true=true", false),
        ] {
            let listener = listener();
            listener.handle_request(&callback(query));

            assert_eq!(listener.approval_status(), Some(expected), "query {:?}", query);
        }
    }

    #[test]
    fn non_matching_path_leaves_status_unknown() {
        let listener = listener();
        let response = listener.handle_request(&"/favicon.ico".parse().unwrap());

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(listener.approval_status(), None);
        assert_eq!(listener.gate.available_permits(), 1);
    }

    #[test]
    fn landing_page_redirects() {
        let listener = GrantListener::new(
            String::from("/Approved"),
            Some(String::from("https://example.com/ok")),
            Some(String::from("https://example.com/failed")),
            None,
        );

        let response = listener.handle_request(&callback("approved=true"));
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "https://example.com/ok");

        let response = listener.handle_request(&callback("denied=true"));
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "https://example.com/failed");
    }

    #[test]
    fn missing_landing_page_file_falls_back_to_inline_page() {
        let listener = GrantListener::new(
            String::from("/Approved"),
            None,
            None,
            Some(PathBuf::from("/nonexistent/ferritmdb/landing")),
        );

        assert_eq!(listener.landing_page(true), APPROVED_PAGE);
        assert_eq!(listener.landing_page(false), FAILURE_PAGE);
    }

    #[test]
    fn landing_page_is_read_from_dir() {
        let dir = std::env::temp_dir().join(format!("ferritmdb-landing-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(APPROVED_PAGE_FILE), "<p>custom</p>").unwrap();

        let listener = GrantListener::new(String::from("/Approved"), None, None, Some(dir.clone()));

        assert_eq!(listener.landing_page(true), "<p>custom</p>");
        assert_eq!(listener.landing_page(false), FAILURE_PAGE);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn release_before_wait_is_not_lost() {
        let listener = listener();
        listener.handle_request(&callback("approved=true"));

        let approved = tokio::time::timeout(Duration::from_secs(1), listener.wait_for_approval_status())
            .await
            .expect("wait should return after a callback")
            .unwrap();

        assert!(approved);
    }

    #[tokio::test]
    async fn release_without_callback_is_an_error() {
        let listener = Arc::new(listener());

        let waiter = {
            let listener = Arc::clone(&listener);
            tokio::spawn(async move { listener.wait_for_approval_status().await })
        };

        listener.release();

        let err = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait should return after a release")
            .unwrap()
            .unwrap_err();

        assert_eq!(err.to_string(), "No auth callback received");
    }
}
