//! Token refresh coordinator.
//!
//! Sits on the client's response pipeline and turns expired-access-token
//! failures into a single-flight refresh: no matter how many requests fail
//! concurrently on the same expired token, exactly one `POST /refresh`
//! goes out. Every failed request is parked as a continuation in an
//! ordered queue and settled when that one refresh settles: replayed with
//! the new token on success, rejected with the refresh error on failure.
//!
//! The flag and queue live behind one synchronous mutex that is never held
//! across an await, so the check-flag-and-append step is atomic even on a
//! preemptible multi-threaded runtime. The flag is cleared only after the
//! queue has been fully drained, under the same lock acquisition that
//! drains it, so a late-failing request can never park itself behind a
//! refresh that has already settled.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use tokio::sync::oneshot;

use crate::auth::BearerCell;
use crate::error::{Result, WardenLinkError};
use crate::models::error_body::TOKEN_EXPIRED_CODE;
use crate::models::{RefreshGrant, RefreshRequest};
use crate::session::SessionManager;
use crate::store::{SessionTokens, TokenStore, REFRESH_TOKEN_KEY};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, REFRESH_PATH};

/// Where the client is running.
///
/// Injected at construction (never probed from the environment) so both
/// behaviors are testable in isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionContext {
    /// A context with an interactive session (a browser tab): fatal
    /// authorization failures sign the user out.
    #[default]
    Interactive,
    /// A one-shot call without an interactive session (a server-side
    /// loader): fatal authorization failures surface as errors with no
    /// side effects on shared session state.
    Detached,
}

/// One request stalled on the pending refresh: the original call, so it
/// can be re-issued, and the continuation that settles the caller.
struct PendingRequest {
    request: ApiRequest,
    settle: oneshot::Sender<Result<ApiResponse>>,
}

#[derive(Default)]
struct RefreshState {
    /// True exactly while one refresh call is outstanding
    refreshing: bool,
    /// Insertion-ordered continuations; non-empty only while `refreshing`
    queue: VecDeque<PendingRequest>,
}

/// The refresh coordinator. One per client; holds no ambient globals.
pub struct RefreshCoordinator {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn TokenStore>,
    bearer: BearerCell,
    session: SessionManager,
    context: ExecutionContext,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    /// Create a coordinator sharing the session's token store and bearer
    /// cell
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        session: SessionManager,
        context: ExecutionContext,
    ) -> Self {
        Self {
            transport,
            store: session.token_store(),
            bearer: session.bearer(),
            session,
            context,
            state: Mutex::new(RefreshState::default()),
        }
    }

    /// The execution context this coordinator was built for
    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    /// Inspect one response from the HTTP client.
    ///
    /// Anything that is not a 401 passes through unchanged. A 401 carrying
    /// the `token.expired` code enters the refresh protocol and resolves
    /// to the replayed request's outcome; any other 401 is fatal to the
    /// session (see [`ExecutionContext`]).
    pub async fn handle(&self, request: &ApiRequest, response: ApiResponse) -> Result<ApiResponse> {
        if response.status != 401 {
            return Ok(response);
        }

        match response.error_code() {
            Some(TOKEN_EXPIRED_CODE) => {
                debug!(
                    "[REFRESH] expired access token on {} {}",
                    request.method, request.path
                );
                self.recover(request.clone()).await
            }
            _ => self.reject_session(response),
        }
    }

    /// Number of requests currently parked behind the pending refresh
    pub fn pending(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .queue
            .len()
    }

    fn reject_session(&self, response: ApiResponse) -> Result<ApiResponse> {
        let message = response.error_message();
        match self.context {
            ExecutionContext::Interactive => {
                warn!("[REFRESH] non-expiry 401, terminating session: {}", message);
                self.session.invalidate()?;
                Err(WardenLinkError::InvalidSession(message))
            }
            ExecutionContext::Detached => {
                debug!("[REFRESH] non-expiry 401 in detached context: {}", message);
                Err(WardenLinkError::InvalidSession(message))
            }
        }
    }

    /// Park the failed request behind the refresh, becoming the leader
    /// that issues it if none is outstanding, and wait for settlement.
    async fn recover(&self, request: ApiRequest) -> Result<ApiResponse> {
        let (settle_tx, settle_rx) = oneshot::channel();

        let leader = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.queue.push_back(PendingRequest {
                request,
                settle: settle_tx,
            });
            // Atomic with the append above: whoever flips the flag owns
            // the one refresh call
            !std::mem::replace(&mut state.refreshing, true)
        };

        if leader {
            self.run_refresh().await;
        }

        match settle_rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(WardenLinkError::InternalError(
                "refresh settled without delivering an outcome".into(),
            )),
        }
    }

    /// Issue the one refresh call and settle the queue either way.
    async fn run_refresh(&self) {
        // Re-read the refresh token: it may have rotated since the failing
        // request was issued.
        let refresh_token = match self.store.get(REFRESH_TOKEN_KEY) {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.settle_failure(WardenLinkError::RefreshFailed(
                    "no refresh token in credential store".into(),
                ));
                return;
            }
            Err(e) => {
                self.settle_failure(WardenLinkError::RefreshFailed(e.to_string()));
                return;
            }
        };

        debug!("[REFRESH] issuing single-flight refresh call");
        let body = match serde_json::to_value(RefreshRequest { refresh_token }) {
            Ok(body) => body,
            Err(e) => {
                self.settle_failure(WardenLinkError::RefreshFailed(e.to_string()));
                return;
            }
        };

        match self.transport.send(ApiRequest::post(REFRESH_PATH, body)).await {
            Ok(response) if response.is_success() => match response.json::<RefreshGrant>() {
                Ok(grant) => self.settle_success(grant),
                Err(e) => self.settle_failure(WardenLinkError::RefreshFailed(format!(
                    "malformed refresh response: {}",
                    e
                ))),
            },
            Ok(response) => {
                self.settle_failure(WardenLinkError::RefreshFailed(response.error_message()))
            }
            Err(e) => self.settle_failure(WardenLinkError::RefreshFailed(e.to_string())),
        }
    }

    /// Persist the rotated pair, update the default header, and replay
    /// every parked request with the new token.
    fn settle_success(&self, grant: RefreshGrant) {
        let tokens = SessionTokens {
            access_token: grant.token,
            refresh_token: grant.refresh_token,
        };
        if let Err(e) = tokens.persist(self.store.as_ref()) {
            self.settle_failure(WardenLinkError::RefreshFailed(e.to_string()));
            return;
        }
        self.bearer.set(tokens.access_token.clone());

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        debug!(
            "[REFRESH] token pair rotated, replaying {} pending request(s)",
            state.queue.len()
        );

        // Replays start in insertion order; each caller receives its own
        // retry's outcome, in whatever order the retries complete.
        while let Some(pending) = state.queue.pop_front() {
            let transport = Arc::clone(&self.transport);
            let request = pending.request.with_bearer(tokens.access_token.clone());
            let settle = pending.settle;
            tokio::spawn(async move {
                let outcome = transport.send(request).await;
                // The caller may have been dropped; nothing to do then
                let _ = settle.send(outcome);
            });
        }
        state.refreshing = false;
    }

    /// Reject every parked request with the same refresh error, then
    /// terminate the session (interactive contexts only).
    fn settle_failure(&self, error: WardenLinkError) {
        warn!("[REFRESH] refresh failed: {}", error);
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            while let Some(pending) = state.queue.pop_front() {
                let _ = pending.settle.send(Err(error.clone()));
            }
            state.refreshing = false;
        }

        // Queued requests are settled above, before the sign-out sequence
        if self.context == ExecutionContext::Interactive {
            if let Err(e) = self.session.invalidate() {
                warn!("[REFRESH] sign-out after failed refresh failed: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("RefreshCoordinator")
            .field("context", &self.context)
            .field("refreshing", &state.refreshing)
            .field("pending", &state.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpTransport for CountingTransport {
        async fn send(&self, _request: ApiRequest) -> Result<ApiResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(WardenLinkError::NetworkError("unreachable".into()))
        }
    }

    fn coordinator(context: ExecutionContext) -> (Arc<CountingTransport>, RefreshCoordinator) {
        let transport = Arc::new(CountingTransport {
            calls: AtomicUsize::new(0),
        });
        let session = SessionManager::builder()
            .transport(transport.clone() as Arc<dyn HttpTransport>)
            .build()
            .unwrap();
        let coordinator =
            RefreshCoordinator::new(transport.clone() as Arc<dyn HttpTransport>, session, context);
        (transport, coordinator)
    }

    #[tokio::test]
    async fn test_non_401_passes_through_unchanged() {
        let (transport, coordinator) = coordinator(ExecutionContext::Interactive);
        let request = ApiRequest::get("/reports");

        for status in [200, 204, 403, 404, 500] {
            let response = ApiResponse { status, body: None };
            let out = coordinator.handle(&request, response).await.unwrap();
            assert_eq!(out.status, status);
        }

        // Passthrough never touches the network
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_expiry_401_detached_returns_invalid_session() {
        let (transport, coordinator) = coordinator(ExecutionContext::Detached);
        let request = ApiRequest::get("/reports");
        let response = ApiResponse {
            status: 401,
            body: Some(serde_json::json!({ "code": "session.revoked" })),
        };

        let err = coordinator.handle(&request, response).await.unwrap_err();
        assert!(matches!(err, WardenLinkError::InvalidSession(_)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_401_without_refresh_token_fails_refresh() {
        let (_transport, coordinator) = coordinator(ExecutionContext::Detached);
        let request = ApiRequest::get("/reports");
        let response = ApiResponse {
            status: 401,
            body: Some(serde_json::json!({ "code": TOKEN_EXPIRED_CODE })),
        };

        // The store is empty, so the refresh cannot even be attempted
        let err = coordinator.handle(&request, response).await.unwrap_err();
        assert!(matches!(err, WardenLinkError::RefreshFailed(_)));
        assert_eq!(coordinator.pending(), 0);
    }
}
