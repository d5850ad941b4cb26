//! The local listener that catches the consent page's redirect, and its configuration.

use std::{
    borrow::Cow,
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use axum::Router;
use log::{debug, error, warn};
use tokio::{runtime::Handle, sync::oneshot, task::JoinHandle};

use super::grant_listener::{self, GrantListener};
use crate::error::{Error, Result};

const DEFAULT_PROTOCOL_PREFIX: &str = "http://";
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_CALLBACK_PATH: &str = "/Approved";
const DEFAULT_PORT: u16 = 8895;

/// How long stopping waits for open connections to finish before the listener is torn down regardless.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(2);

const HOST_ENV: &str = "TMDB_GRANT_RECEIVER_HOST";
const PORT_ENV: &str = "TMDB_GRANT_RECEIVER_PORT";
const CALLBACK_PATH_ENV: &str = "TMDB_GRANT_RECEIVER_CALLBACK_PATH";
const SUCCESS_URL_ENV: &str = "TMDB_GRANT_RECEIVER_SUCCESS_URL";
const FAILURE_URL_ENV: &str = "TMDB_GRANT_RECEIVER_FAILURE_URL";

/// Configuration of the [GrantReceiver]. Built with [GrantReceiverConfig::builder] or
/// [GrantReceiverConfigBuilder::from_env]; the default listens on `http://localhost:8895/Approved`.
///
/// The host and the callback path are stored URL-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantReceiverConfig {
    protocol_prefix: String,
    host: String,
    callback_path: String,
    port: u16,
    success_landing_page_url: Option<String>,
    failure_landing_page_url: Option<String>,
    landing_page_dir: Option<PathBuf>,
    approval_timeout: Option<Duration>,
}

/// Builder for [GrantReceiverConfig].
#[derive(Debug, Clone, Default)]
pub struct GrantReceiverConfigBuilder {
    protocol_prefix: Option<String>,
    host: Option<String>,
    callback_path: Option<String>,
    port: Option<String>,
    success_landing_page_url: Option<String>,
    failure_landing_page_url: Option<String>,
    landing_page_dir: Option<PathBuf>,
    approval_timeout: Option<Duration>,
}

impl Default for GrantReceiverConfig {
    fn default() -> Self {
        Self {
            protocol_prefix: String::from(DEFAULT_PROTOCOL_PREFIX),
            host: String::from(DEFAULT_HOST),
            callback_path: String::from(DEFAULT_CALLBACK_PATH),
            port: DEFAULT_PORT,
            success_landing_page_url: None,
            failure_landing_page_url: None,
            landing_page_dir: None,
            approval_timeout: None,
        }
    }
}

impl GrantReceiverConfig {
    pub fn builder() -> GrantReceiverConfigBuilder {
        GrantReceiverConfigBuilder::default()
    }

    /// The URL the consent page redirects back to: the protocol prefix, host, port and callback path.
    pub fn redirect_url(&self) -> String {
        format!(
            "{}{}:{}{}",
            self.protocol_prefix, self.host, self.port, self.callback_path
        )
    }

    pub fn protocol_prefix(&self) -> &str {
        &self.protocol_prefix
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn callback_path(&self) -> &str {
        &self.callback_path
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn success_landing_page_url(&self) -> Option<&str> {
        self.success_landing_page_url.as_deref()
    }

    pub fn failure_landing_page_url(&self) -> Option<&str> {
        self.failure_landing_page_url.as_deref()
    }

    pub fn approval_timeout(&self) -> Option<Duration> {
        self.approval_timeout
    }

    fn bind_host(&self) -> Cow<'_, str> {
        urlencoding::decode(&self.host).unwrap_or(Cow::Borrowed(self.host.as_str()))
    }
}

impl GrantReceiverConfigBuilder {
    /// Read the configuration from the `TMDB_GRANT_RECEIVER_HOST`, `TMDB_GRANT_RECEIVER_PORT`,
    /// `TMDB_GRANT_RECEIVER_CALLBACK_PATH`, `TMDB_GRANT_RECEIVER_SUCCESS_URL` and `TMDB_GRANT_RECEIVER_FAILURE_URL`
    /// environment variables. Unset or blank variables leave the default in place.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Self {
            host: non_blank(HOST_ENV),
            port: non_blank(PORT_ENV),
            callback_path: non_blank(CALLBACK_PATH_ENV),
            success_landing_page_url: non_blank(SUCCESS_URL_ENV),
            failure_landing_page_url: non_blank(FAILURE_URL_ENV),
            ..Self::default()
        }
    }

    /// Defaults to `http://`.
    pub fn protocol_prefix<S>(self, protocol_prefix: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            protocol_prefix: Some(protocol_prefix.into()),
            ..self
        }
    }

    /// Defaults to `localhost`.
    pub fn host<S>(self, host: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            host: Some(host.into()),
            ..self
        }
    }

    /// Defaults to `/Approved`.
    pub fn callback_path<S>(self, callback_path: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            callback_path: Some(callback_path.into()),
            ..self
        }
    }

    /// Defaults to 8895. Ports outside 1-65535 fail [build](GrantReceiverConfigBuilder::build).
    pub fn port(self, port: u32) -> Self {
        Self {
            port: Some(port.to_string()),
            ..self
        }
    }

    /// Redirect the user's browser here after they approve the request, instead of showing the built-in page.
    pub fn success_landing_page_url<S>(self, url: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            success_landing_page_url: Some(url.into()),
            ..self
        }
    }

    /// Redirect the user's browser here after they deny the request, instead of showing the built-in page.
    pub fn failure_landing_page_url<S>(self, url: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            failure_landing_page_url: Some(url.into()),
            ..self
        }
    }

    /// A directory containing `approved.html` and `failure.html` to show instead of the built-in landing pages. The
    /// files are read when a callback is handled; if one can't be read, the built-in page is shown.
    pub fn landing_page_dir<P>(self, dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            landing_page_dir: Some(dir.into()),
            ..self
        }
    }

    /// Give up waiting for the callback after the given time. The receiver waits indefinitely by default.
    pub fn approval_timeout(self, timeout: Duration) -> Self {
        Self {
            approval_timeout: Some(timeout),
            ..self
        }
    }

    pub fn build(self) -> Result<GrantReceiverConfig> {
        let port = match self.port.as_deref().map(str::trim).filter(|port| !port.is_empty()) {
            Some(port) => parse_port(port)?,
            None => DEFAULT_PORT,
        };

        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        let callback_path = self.callback_path.as_deref().unwrap_or(DEFAULT_CALLBACK_PATH);

        Ok(GrantReceiverConfig {
            protocol_prefix: self
                .protocol_prefix
                .unwrap_or_else(|| String::from(DEFAULT_PROTOCOL_PREFIX)),
            host: urlencoding::encode(host).into_owned(),
            callback_path: encode_path(callback_path),
            port,
            success_landing_page_url: self.success_landing_page_url,
            failure_landing_page_url: self.failure_landing_page_url,
            landing_page_dir: self.landing_page_dir,
            approval_timeout: self.approval_timeout,
        })
    }
}

fn parse_port(port: &str) -> Result<u16> {
    port.parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| Error::InvalidPort(port.to_owned()))
}

/// Encodes each segment of the path separately so the separators survive. The result always starts with a slash.
fn encode_path(path: &str) -> String {
    let encoded = path
        .trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");

    format!("/{}", encoded)
}

/// The local HTTP listener the consent page redirects the user's browser back to.
///
/// [start](GrantReceiver::start) binds the configured port and serves the callback on the current Tokio runtime;
/// [wait_for_approval_status](GrantReceiver::wait_for_approval_status) waits until the callback has been received.
/// [stop](GrantReceiver::stop) releases any waiter and shuts the listener down. Dropping a started receiver does the
/// same without waiting for the listener task to finish.
#[derive(Debug)]
pub struct GrantReceiver {
    config: GrantReceiverConfig,
    listener: Arc<GrantListener>,
    running: Mutex<Option<RunningListener>>,
}

#[derive(Debug)]
struct RunningListener {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl GrantReceiver {
    pub fn new(config: GrantReceiverConfig) -> Self {
        let listener = GrantListener::new(
            config.callback_path.clone(),
            config.success_landing_page_url.clone(),
            config.failure_landing_page_url.clone(),
            config.landing_page_dir.clone(),
        );

        Self {
            config,
            listener: Arc::new(listener),
            running: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &GrantReceiverConfig {
        &self.config
    }

    pub fn redirect_url(&self) -> String {
        self.config.redirect_url()
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().expect("grant receiver mutex poisoned").is_some()
    }

    /// The address the listener is bound to, if it is running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running
            .lock()
            .expect("grant receiver mutex poisoned")
            .as_ref()
            .map(|running| running.local_addr)
    }

    /// Bind the configured port and start serving the callback. Has to be called within a Tokio runtime. Calling this
    /// on a receiver that is already running does nothing.
    pub fn start(&self) -> Result<&Self> {
        let mut running = self.running.lock().expect("grant receiver mutex poisoned");

        if let Some(running) = running.as_ref() {
            debug!("Grant receiver already listening on {}", running.local_addr);
            return Ok(self);
        }

        let runtime = Handle::try_current()
            .map_err(|err| Error::session_with_source("Failed to start the grant receiver", err))?;

        let bind_host = self.config.bind_host();
        let port = self.config.port;

        let std_listener = std::net::TcpListener::bind((bind_host.as_ref(), port))
            .and_then(|listener| listener.set_nonblocking(true).map(|_| listener))
            .map_err(|err| {
                error!("Failed to bind grant receiver to {}:{}: {}", bind_host, port, err);
                Error::session_with_source(format!("Failed to bind the grant receiver to {bind_host}:{port}"), err)
            })?;

        let local_addr = std_listener
            .local_addr()
            .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], port)));

        let tcp_listener = {
            let _guard = runtime.enter();
            tokio::net::TcpListener::from_std(std_listener)
        }
        .map_err(|err| Error::session_with_source("Failed to start the grant receiver", err))?;

        let app = Router::new()
            .fallback(grant_listener::handle_callback)
            .with_state(Arc::clone(&self.listener));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = runtime.spawn(async move {
            let serve = axum::serve(tcp_listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });

            if let Err(err) = serve.await {
                error!("Grant receiver on {} failed: {}", local_addr, err);
            }
        });

        debug!(
            "Grant receiver listening on {} for {}",
            local_addr,
            self.config.redirect_url()
        );

        *running = Some(RunningListener {
            local_addr,
            shutdown: shutdown_tx,
            task,
        });

        Ok(self)
    }

    /// Wait until the consent page's redirect has been received and return whether the user approved the request.
    ///
    /// Fails with a [Session-error](Error::Session) if the receiver is stopped before a callback arrives, or if the
    /// configured approval timeout elapses.
    pub async fn wait_for_approval_status(&self) -> Result<bool> {
        match self.config.approval_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.listener.wait_for_approval_status())
                .await
                .map_err(|err| {
                    warn!("No auth callback received in {:?}", timeout);
                    Error::session_with_source("Timed out waiting for the auth callback", err)
                })?,

            None => self.listener.wait_for_approval_status().await,
        }
    }

    /// Release anyone waiting for the approval status and shut the listener down. Stopping a receiver that isn't
    /// running only releases the waiters.
    ///
    /// Open connections are given a short grace period to finish. After it the listener is torn down without waiting
    /// for connections that never completed their request.
    pub async fn stop(&self) -> Result<()> {
        self.listener.release();

        let running = self.running.lock().expect("grant receiver mutex poisoned").take();
        let Some(running) = running else {
            return Ok(());
        };

        let RunningListener {
            local_addr,
            shutdown,
            mut task,
        } = running;

        // the server task may already be gone if serving failed
        let _ = shutdown.send(());

        match tokio::time::timeout(SHUTDOWN_GRACE_PERIOD, &mut task).await {
            Ok(joined) => {
                joined.map_err(|err| Error::session_with_source("Failed to stop the grant receiver", err))?;
            }

            Err(_) => {
                // graceful shutdown waits for every open connection, including ones that never finish their request
                warn!(
                    "Grant receiver on {} didn't shut down in {:?}, aborting it",
                    local_addr, SHUTDOWN_GRACE_PERIOD
                );

                task.abort();

                match task.await {
                    Err(err) if !err.is_cancelled() => {
                        return Err(Error::session_with_source("Failed to stop the grant receiver", err));
                    }
                    _ => {}
                }
            }
        }

        debug!("Grant receiver on {} stopped", local_addr);
        Ok(())
    }
}

impl Drop for GrantReceiver {
    fn drop(&mut self) {
        self.listener.release();

        let running = self.running.get_mut().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(running) = running {
            debug!("Grant receiver on {} dropped while running", running.local_addr);
            let _ = running.shutdown.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        move |name| vars.get(name).cloned()
    }

    #[test]
    fn default_redirect_url() {
        let config = GrantReceiverConfig::builder().build().unwrap();

        assert_eq!(config, GrantReceiverConfig::default());
        assert_eq!(config.redirect_url(), "http://localhost:8895/Approved");
    }

    #[test]
    fn valid_ports() {
        for port in [1, 8080, 65535] {
            let config = GrantReceiverConfig::builder().port(port).build().unwrap();
            assert_eq!(u32::from(config.port()), port);
        }
    }

    #[test]
    fn out_of_range_ports_fail() {
        for port in [0, 65536, 100_000] {
            let err = GrantReceiverConfig::builder().port(port).build().unwrap_err();
            assert!(matches!(err, Error::InvalidPort(_)), "port {}", port);
        }
    }

    #[test]
    fn host_and_path_are_encoded() {
        let config = GrantReceiverConfig::builder()
            .host("my host")
            .callback_path("callback/ok done")
            .port(9000)
            .build()
            .unwrap();

        assert_eq!(config.host(), "my%20host");
        assert_eq!(config.callback_path(), "/callback/ok%20done");
        assert_eq!(config.redirect_url(), "http://my%20host:9000/callback/ok%20done");
        assert_eq!(config.bind_host(), "my host");
    }

    #[test]
    fn env_lookup() {
        let config = GrantReceiverConfigBuilder::from_lookup(lookup(&[
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "9999"),
            (CALLBACK_PATH_ENV, "/done"),
            (SUCCESS_URL_ENV, "https://example.com/ok"),
        ]))
        .build()
        .unwrap();

        assert_eq!(config.redirect_url(), "http://127.0.0.1:9999/done");
        assert_eq!(config.success_landing_page_url(), Some("https://example.com/ok"));
        assert_eq!(config.failure_landing_page_url(), None);
    }

    #[test]
    fn blank_env_values_use_defaults() {
        let config = GrantReceiverConfigBuilder::from_lookup(lookup(&[(HOST_ENV, " "), (PORT_ENV, "")]))
            .build()
            .unwrap();

        assert_eq!(config.redirect_url(), "http://localhost:8895/Approved");
    }

    #[test]
    fn invalid_env_port_fails() {
        for port in ["-1", "70000", "http"] {
            let err = GrantReceiverConfigBuilder::from_lookup(lookup(&[(PORT_ENV, port)]))
                .build()
                .unwrap_err();

            assert!(matches!(err, Error::InvalidPort(ref raw) if raw == port), "port {}", port);
        }
    }

    #[test]
    fn start_outside_runtime_fails() {
        let receiver = GrantReceiver::new(GrantReceiverConfig::builder().port(18_891).build().unwrap());
        let err = receiver.start().unwrap_err();

        assert!(matches!(err, Error::Session { .. }));
        assert!(!receiver.is_running());
    }
}
