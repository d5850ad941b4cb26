//! Acquiring and releasing sessions.
//!
//! A user session is acquired interactively by the [SessionManager]:
//!
//! 1. a request token is created,
//! 2. a local [GrantReceiver] starts listening for the consent page's redirect and the consent page is opened in the
//!    user's browser (or printed to the console if a browser can't be opened),
//! 3. once the user approves the request, the token is exchanged for a session.
//!
//! ```no_run
//! # use ferritmdb::{client::TmdbClientBuilder, session::{GrantReceiverConfig, SessionManager}};
//! # async fn foo() -> ferritmdb::Result<()> {
//! let tmdb_client = TmdbClientBuilder::new("API read access token").build()?;
//! let config = GrantReceiverConfig::builder().port(8080).build()?;
//!
//! let session_manager = SessionManager::new(tmdb_client).with_grant_receiver_config(config);
//! let session_id = session_manager.register_new_session().await?;
//!
//! // ...
//!
//! session_manager.delete_session().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Guest sessions don't require the user's approval; the [GuestSessionManager] creates them with a single request.

mod browser;
mod grant_listener;
mod grant_receiver;

pub use self::{
    browser::{OpenUrl, SystemBrowser},
    grant_receiver::{GrantReceiver, GrantReceiverConfig, GrantReceiverConfigBuilder},
};

use std::sync::RwLock;

use log::{debug, warn};

use crate::{
    client::{AuthenticationClient, TmdbClient, AUTHENTICATE_URL},
    error::{Error, Result},
};

const USER_DENIED_MESSAGE: &str = "The user denied the authentication request";

/// Holds a session identifier. The identifier is only ever replaced or cleared as a whole.
#[derive(Debug, Default)]
struct SessionSlot(RwLock<Option<String>>);

impl SessionSlot {
    /// Blank identifiers count as no session.
    fn get(&self) -> Option<String> {
        self.0
            .read()
            .expect("session slot rwlock poisoned")
            .as_deref()
            .filter(|session_id| !session_id.trim().is_empty())
            .map(str::to_owned)
    }

    fn replace(&self, session_id: String) -> Option<String> {
        self.0.write().expect("session slot rwlock poisoned").replace(session_id)
    }

    fn clear(&self) -> Option<String> {
        self.0.write().expect("session slot rwlock poisoned").take()
    }

    /// Clears the slot only if it still holds the expected identifier.
    fn clear_if(&self, expected: &str) -> bool {
        let mut slot = self.0.write().expect("session slot rwlock poisoned");

        if slot.as_deref() == Some(expected) {
            *slot = None;
            true
        } else {
            false
        }
    }
}

/// Acquires a user session through TMDB's consent page and keeps its identifier.
pub struct SessionManager<C = TmdbClient> {
    client: C,
    grant_receiver_config: GrantReceiverConfig,
    browser: Box<dyn OpenUrl>,
    session_id: SessionSlot,
}

impl<C> SessionManager<C>
where
    C: AuthenticationClient,
{
    /// A manager with the default grant receiver configuration that opens the consent page in the system's browser.
    pub fn new(client: C) -> Self {
        Self {
            client,
            grant_receiver_config: GrantReceiverConfig::default(),
            browser: Box::new(SystemBrowser),
            session_id: SessionSlot::default(),
        }
    }

    pub fn with_grant_receiver_config(self, grant_receiver_config: GrantReceiverConfig) -> Self {
        Self {
            grant_receiver_config,
            ..self
        }
    }

    /// Hand the consent page URL to something other than the system's browser.
    pub fn with_browser<B>(self, browser: B) -> Self
    where
        B: OpenUrl + 'static,
    {
        Self {
            browser: Box::new(browser),
            ..self
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// The current session identifier, if there is one.
    pub fn session_id(&self) -> Option<String> {
        self.session_id.get()
    }

    /// Forget the current session identifier without deleting the session, and return it.
    pub fn clear_session_id(&self) -> Option<String> {
        self.session_id.clear()
    }

    /// Run the interactive flow and store the new session's identifier, replacing any previous one.
    ///
    /// Waits until the user approves or denies the request on the consent page. The grant receiver is stopped before
    /// this function returns, whatever the outcome.
    pub async fn register_new_session(&self) -> Result<String> {
        let request_token = self
            .client
            .create_request_token()
            .await
            .map_err(|err| Error::session_with_source("Error creating new request token", err))?
            .request_token;

        let consent_url = consent_url(&request_token, &self.grant_receiver_config.redirect_url())?;
        debug!("Consent page: {}", consent_url);

        let receiver = GrantReceiver::new(self.grant_receiver_config.clone());
        let approval = self.wait_for_approval(&receiver, &consent_url).await;
        let stopped = receiver.stop().await;

        if !approval? {
            warn!("User denied the authentication request");
            return Err(Error::session(USER_DENIED_MESSAGE));
        }

        stopped?;

        let new_session = self
            .client
            .create_session(&request_token)
            .await
            .map_err(|err| Error::session_with_source("Error creating new session", err))?;

        if !new_session.success || new_session.session_id.trim().is_empty() {
            return Err(Error::session("Error creating new session"));
        }

        debug!("New session created");
        self.session_id.replace(new_session.session_id.clone());

        Ok(new_session.session_id)
    }

    async fn wait_for_approval(&self, receiver: &GrantReceiver, consent_url: &str) -> Result<bool> {
        receiver.start()?;
        self.browser.open_url(consent_url);
        receiver.wait_for_approval_status().await
    }

    /// Delete the current session and forget its identifier. Does nothing if there is no session.
    pub async fn delete_session(&self) -> Result<()> {
        let Some(session_id) = self.session_id.get() else {
            debug!("No session to delete");
            return Ok(());
        };

        let deletion = self
            .client
            .delete_session(&session_id)
            .await
            .map_err(|err| Error::session_with_source("Error deleting session", err))?;

        if !deletion.success {
            return Err(Error::session("Error deleting session"));
        }

        self.session_id.clear_if(&session_id);
        debug!("Session deleted");

        Ok(())
    }
}

/// Creates guest sessions and keeps the identifier. Guest sessions don't require the user's approval.
#[derive(Debug)]
pub struct GuestSessionManager<C = TmdbClient> {
    client: C,
    guest_session_id: SessionSlot,
}

impl<C> GuestSessionManager<C>
where
    C: AuthenticationClient,
{
    pub fn new(client: C) -> Self {
        Self {
            client,
            guest_session_id: SessionSlot::default(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn guest_session_id(&self) -> Option<String> {
        self.guest_session_id.get()
    }

    pub fn clear_guest_session_id(&self) -> Option<String> {
        self.guest_session_id.clear()
    }

    /// Create a new guest session and store its identifier, replacing any previous one.
    pub async fn register_new_session(&self) -> Result<String> {
        let new_session = self
            .client
            .create_guest_session()
            .await
            .map_err(|err| Error::session_with_source("Error creating new guest session", err))?;

        let guest_session_id = match new_session.guest_session_id {
            Some(guest_session_id) if new_session.success && !guest_session_id.trim().is_empty() => guest_session_id,
            _ => return Err(Error::session(USER_DENIED_MESSAGE)),
        };

        debug!("New guest session created");
        self.guest_session_id.replace(guest_session_id.clone());

        Ok(guest_session_id)
    }

    /// Delete the current guest session and forget its identifier. Does nothing if there is no guest session.
    pub async fn delete_session(&self) -> Result<()> {
        let Some(guest_session_id) = self.guest_session_id.get() else {
            debug!("No guest session to delete");
            return Ok(());
        };

        let deletion = self
            .client
            .delete_guest_session(&guest_session_id)
            .await
            .map_err(|err| Error::session_with_source("Error deleting session", err))?;

        if !deletion.success {
            return Err(Error::session("Error deleting session"));
        }

        self.guest_session_id.clear_if(&guest_session_id);
        debug!("Guest session deleted");

        Ok(())
    }
}

/// The consent page for the request token. The redirect URL is appended as-is; its host and path are already encoded.
fn consent_url(request_token: &str, redirect_url: &str) -> Result<String> {
    if request_token.trim().is_empty() {
        return Err(Error::InvalidArgument("the request token must not be blank".into()));
    }

    Ok(format!(
        "{}{}?redirect_to={}",
        AUTHENTICATE_URL,
        urlencoding::encode(request_token),
        redirect_url
    ))
}
