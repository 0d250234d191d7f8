//! Session state machine.
//!
//! Owns the in-memory identity and orchestrates the session lifecycle:
//! sign-in, sign-out, bootstrap from persisted credentials on startup, and
//! cross-tab synchronization over the auth bus. Tokens themselves are
//! never held here; they live in the injected [`TokenStore`], which the
//! refresh coordinator shares.
//!
//! The machine has two states, `Unauthenticated` and
//! `Authenticated(Identity)`, represented as `Option<Identity>`. Every
//! transition replaces the snapshot wholesale.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use warden_link::models::Credentials;
//! use warden_link::session::SessionManager;
//! use warden_link::transport::ReqwestTransport;
//!
//! # async fn example() -> warden_link::Result<()> {
//! let transport = Arc::new(ReqwestTransport::new("http://localhost:3333")?);
//! let session = SessionManager::builder().transport(transport).build()?;
//!
//! // Resume a persisted session, if one exists
//! session.bootstrap().await?;
//!
//! if !session.is_authenticated() {
//!     session
//!         .sign_in(Credentials::new("a@b.com", "secret"))
//!         .await?;
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use log::{debug, warn};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::auth::BearerCell;
use crate::bus::{AuthBus, AuthEvent, BroadcastAuthBus, BusMessage, TabId};
use crate::error::{Result, WardenLinkError};
use crate::models::{Credentials, Identity, ProfileResponse, SessionGrant, SignInRequest};
use crate::navigator::{Navigator, NoopNavigator, AUTHENTICATED_LANDING, PUBLIC_LANDING};
use crate::store::{
    MemoryTokenStore, SessionTokens, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
use crate::transport::{ApiRequest, HttpTransport, PROFILE_PATH, SESSIONS_PATH};

static NEXT_TAB_ID: AtomicU64 = AtomicU64::new(1);

struct SessionInner {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn TokenStore>,
    bus: Arc<dyn AuthBus>,
    navigator: Arc<dyn Navigator>,
    bearer: BearerCell,
    identity: RwLock<Option<Identity>>,
    tab_id: TabId,
}

/// The session state machine.
///
/// Cheap to clone; all clones share state, so the refresh coordinator can
/// hold one while the host application holds another.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    /// Create a new builder for configuring the session manager
    pub fn builder() -> SessionManagerBuilder {
        SessionManagerBuilder::new()
    }

    /// Current identity snapshot, or `None` when unauthenticated
    pub fn identity(&self) -> Option<Identity> {
        self.inner
            .identity
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// `true` while in the `Authenticated` state
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .identity
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// The shared bearer cell backing the default Authorization header
    pub fn bearer(&self) -> BearerCell {
        self.inner.bearer.clone()
    }

    /// The shared token store
    pub fn token_store(&self) -> Arc<dyn TokenStore> {
        Arc::clone(&self.inner.store)
    }

    /// Identifier of this session instance on the auth bus
    pub fn tab_id(&self) -> TabId {
        self.inner.tab_id
    }

    /// Restore a session from persisted credentials.
    ///
    /// With no stored access token the machine stays `Unauthenticated`.
    /// With one, the profile is fetched; success transitions to
    /// `Authenticated`, while any failure is treated as an expired or
    /// invalid session (not a retryable error) and performs the full
    /// sign-out sequence.
    pub async fn bootstrap(&self) -> Result<Option<Identity>> {
        let token = match self.inner.store.get(ACCESS_TOKEN_KEY)? {
            Some(token) => token,
            None => {
                debug!("[SESSION] bootstrap: no persisted access token");
                return Ok(None);
            }
        };

        self.inner.bearer.set(token.clone());
        let request = ApiRequest::get(PROFILE_PATH).with_bearer(token);

        let profile = match self.inner.transport.send(request).await {
            Ok(response) if response.is_success() => response.json::<ProfileResponse>(),
            Ok(response) => Err(WardenLinkError::ServerError {
                status_code: response.status,
                message: response.error_message(),
            }),
            Err(e) => Err(e),
        };

        match profile {
            Ok(profile) => {
                let identity = Identity::from(profile);
                debug!("[SESSION] bootstrap: restored session for {}", identity.email);
                let mut slot = self
                    .inner
                    .identity
                    .write()
                    .unwrap_or_else(|e| e.into_inner());
                *slot = Some(identity.clone());
                Ok(Some(identity))
            }
            Err(e) => {
                warn!("[SESSION] bootstrap: persisted session rejected ({}), signing out", e);
                self.sign_out()?;
                Ok(None)
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// On success the token pair is persisted, the default Authorization
    /// header updated, the identity snapshot replaced, a `signIn` event
    /// broadcast to other tabs, and the user navigated to the
    /// authenticated landing destination. On failure the machine stays
    /// `Unauthenticated` and the error is surfaced to the caller with no
    /// navigation and no automatic retry.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<Identity> {
        debug!("[SESSION] signing in {}", credentials.email);

        let body = serde_json::to_value(SignInRequest {
            email: credentials.email.clone(),
            password: credentials.password,
        })?;
        let response = self
            .inner
            .transport
            .send(ApiRequest::post(SESSIONS_PATH, body))
            .await?;

        if !response.is_success() {
            let message = response.error_message();
            debug!("[SESSION] sign-in rejected: {}", message);
            return Err(if (400..500).contains(&response.status) {
                WardenLinkError::InvalidCredentials(message)
            } else {
                WardenLinkError::ServerError {
                    status_code: response.status,
                    message,
                }
            });
        }

        let grant: SessionGrant = response.json()?;

        SessionTokens {
            access_token: grant.token.clone(),
            refresh_token: grant.refresh_token,
        }
        .persist(self.inner.store.as_ref())?;
        self.inner.bearer.set(grant.token);

        let identity = Identity {
            email: credentials.email,
            permissions: grant.permissions,
            roles: grant.roles,
        };
        {
            let mut slot = self
                .inner
                .identity
                .write()
                .unwrap_or_else(|e| e.into_inner());
            *slot = Some(identity.clone());
        }

        debug!("[SESSION] signed in {}", identity.email);
        self.inner
            .bus
            .publish(BusMessage::event(self.inner.tab_id, AuthEvent::SignedIn));
        self.inner.navigator.push(AUTHENTICATED_LANDING);

        Ok(identity)
    }

    /// End the session: clear persisted tokens and the default header,
    /// drop the identity, broadcast `signOut` to other tabs, and navigate
    /// to the public landing destination.
    ///
    /// Idempotent: while already `Unauthenticated` this is a no-op beyond
    /// the navigation (in particular, nothing is re-broadcast).
    pub fn sign_out(&self) -> Result<()> {
        self.end_session(true)
    }

    /// Session termination on behalf of the refresh coordinator: same
    /// effects as [`sign_out`](Self::sign_out)
    pub(crate) fn invalidate(&self) -> Result<()> {
        self.end_session(true)
    }

    fn end_session(&self, broadcast: bool) -> Result<()> {
        let had_identity = {
            let mut slot = self
                .inner
                .identity
                .write()
                .unwrap_or_else(|e| e.into_inner());
            slot.take().is_some()
        };
        let had_tokens = self.inner.store.get(ACCESS_TOKEN_KEY)?.is_some()
            || self.inner.store.get(REFRESH_TOKEN_KEY)?.is_some();

        SessionTokens::clear(self.inner.store.as_ref())?;
        self.inner.bearer.clear();

        if broadcast && (had_identity || had_tokens) {
            debug!("[SESSION] signed out, broadcasting to other tabs");
            self.inner
                .bus
                .publish(BusMessage::event(self.inner.tab_id, AuthEvent::SignedOut));
        }

        self.inner.navigator.push(PUBLIC_LANDING);
        Ok(())
    }

    /// Start listening for auth events from other tabs.
    ///
    /// A remote `signOut` applies the local sign-out effects without
    /// re-broadcasting, then closes this listener. A remote `signIn`
    /// navigates to the authenticated landing destination; the identity is
    /// not transmitted over the channel, each tab re-derives its own via
    /// [`bootstrap`](Self::bootstrap). Unrecognized payloads are ignored.
    pub fn listen(&self) -> JoinHandle<()> {
        let session = self.clone();
        let mut receiver = self.inner.bus.subscribe();

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => {
                        if message.origin == session.inner.tab_id {
                            continue;
                        }
                        match AuthEvent::parse(&message.payload) {
                            Some(AuthEvent::SignedOut) => {
                                debug!("[SESSION] remote sign-out received");
                                if let Err(e) = session.end_session(false) {
                                    warn!("[SESSION] remote sign-out failed: {}", e);
                                }
                                // Closing the local channel handle
                                break;
                            }
                            Some(AuthEvent::SignedIn) => {
                                debug!("[SESSION] remote sign-in received");
                                session.inner.navigator.push(AUTHENTICATED_LANDING);
                            }
                            None => {
                                debug!(
                                    "[SESSION] ignoring unrecognized auth message: {:?}",
                                    message.payload
                                );
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("[SESSION] auth bus lagged, {} message(s) skipped", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("tab_id", &self.inner.tab_id)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

/// Builder for [`SessionManager`] instances.
pub struct SessionManagerBuilder {
    transport: Option<Arc<dyn HttpTransport>>,
    store: Option<Arc<dyn TokenStore>>,
    bus: Option<Arc<dyn AuthBus>>,
    navigator: Option<Arc<dyn Navigator>>,
    bearer: Option<BearerCell>,
}

impl SessionManagerBuilder {
    fn new() -> Self {
        Self {
            transport: None,
            store: None,
            bus: None,
            navigator: None,
            bearer: None,
        }
    }

    /// Set the HTTP transport (required)
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the token store (default: in-memory)
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the cross-tab bus (default: a private in-process `"auth"` channel)
    pub fn bus(mut self, bus: Arc<dyn AuthBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Set the navigation sink (default: no-op)
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Share an existing bearer cell (default: a fresh empty cell)
    pub fn bearer(mut self, bearer: BearerCell) -> Self {
        self.bearer = Some(bearer);
        self
    }

    /// Build the session manager
    pub fn build(self) -> Result<SessionManager> {
        let transport = self
            .transport
            .ok_or_else(|| WardenLinkError::ConfigurationError("transport is required".into()))?;

        Ok(SessionManager {
            inner: Arc::new(SessionInner {
                transport,
                store: self
                    .store
                    .unwrap_or_else(|| Arc::new(MemoryTokenStore::new())),
                bus: self.bus.unwrap_or_else(|| Arc::new(BroadcastAuthBus::new())),
                navigator: self.navigator.unwrap_or_else(|| Arc::new(NoopNavigator)),
                bearer: self.bearer.unwrap_or_default(),
                identity: RwLock::new(None),
                tab_id: NEXT_TAB_ID.fetch_add(1, Ordering::Relaxed),
            }),
        })
    }
}
