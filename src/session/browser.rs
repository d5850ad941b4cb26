use log::{debug, warn};

/// Hands the consent page URL over to the user.
///
/// The [SessionManager](super::SessionManager) calls this once per flow, after the grant receiver has started
/// listening. Implementations must not fail the flow; if the URL can't be shown, the user simply never approves and
/// the flow is ended by stopping the receiver or by its approval timeout.
pub trait OpenUrl: Send + Sync {
    fn open_url(&self, url: &str);
}

/// Opens the URL in the system's default browser, or prints it to the console if no browser could be launched.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl OpenUrl for SystemBrowser {
    fn open_url(&self, url: &str) {
        // the launcher may take a while to exit; don't wait for it on the runtime
        match open::that_detached(url) {
            Ok(()) => debug!("Opened {} in the default browser", url),
            Err(err) => {
                warn!("Failed to open browser: {}", err);
                println!("Please open this URL in your browser to authenticate:\n{}", url);
            }
        }
    }
}

impl<F> OpenUrl for F
where
    F: Fn(&str) + Send + Sync,
{
    fn open_url(&self, url: &str) {
        self(url)
    }
}
