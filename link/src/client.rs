//! Authenticated API client with builder pattern.
//!
//! Wraps the HTTP transport so that every outbound request carries the
//! current bearer token and every response passes through the
//! [`RefreshCoordinator`](crate::coordinator::RefreshCoordinator) before
//! it reaches the caller. An expired access token is therefore invisible
//! to callers whenever the refresh succeeds: the request is replayed with
//! the new token and its retry outcome returned as if nothing happened.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use warden_link::client::WardenClient;
//! use warden_link::session::SessionManager;
//! use warden_link::transport::ReqwestTransport;
//!
//! # async fn example() -> warden_link::Result<()> {
//! let transport = Arc::new(ReqwestTransport::new("http://localhost:3333")?);
//! let session = SessionManager::builder()
//!     .transport(transport.clone())
//!     .build()?;
//!
//! let client = WardenClient::builder()
//!     .transport(transport)
//!     .session(session.clone())
//!     .build()?;
//!
//! let _reports: serde_json::Value = client.get_json("/reports").await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::BearerCell;
use crate::coordinator::{ExecutionContext, RefreshCoordinator};
use crate::error::{Result, WardenLinkError};
use crate::models::error_body::TOKEN_EXPIRED_CODE;
use crate::session::SessionManager;
use crate::store::ACCESS_TOKEN_KEY;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};

/// Authenticated API client.
///
/// Cheap to clone. Construct with [`WardenClient::builder`], passing the
/// session manager whose store and bearer cell the refresh protocol
/// shares.
#[derive(Clone)]
pub struct WardenClient {
    transport: Arc<dyn HttpTransport>,
    bearer: BearerCell,
    coordinator: Arc<RefreshCoordinator>,
}

impl WardenClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> WardenClientBuilder {
        WardenClientBuilder::new()
    }

    /// Send one request through the full pipeline: attach the current
    /// bearer token, then pass the response through the refresh
    /// coordinator.
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        request.bearer = self.bearer.get();
        let response = self.transport.send(request.clone()).await?;
        self.coordinator.handle(&request, response).await
    }

    /// GET a JSON resource
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(ApiRequest::get(path)).await?;
        Self::expect_json(response)
    }

    /// POST a JSON body and parse a JSON response
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let response = self
            .execute(ApiRequest::post(path, serde_json::to_value(body)?))
            .await?;
        Self::expect_json(response)
    }

    fn expect_json<T: DeserializeOwned>(response: ApiResponse) -> Result<T> {
        if response.is_success() {
            response.json()
        } else if response.status == 401 && response.error_code() == Some(TOKEN_EXPIRED_CODE) {
            // The post-refresh replay came back expired again; the
            // protocol allows a single retry per expiry event
            Err(WardenLinkError::TokenExpired)
        } else {
            Err(WardenLinkError::ServerError {
                status_code: response.status,
                message: response.error_message(),
            })
        }
    }
}

impl std::fmt::Debug for WardenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WardenClient")
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

/// Builder for configuring [`WardenClient`] instances.
pub struct WardenClientBuilder {
    transport: Option<Arc<dyn HttpTransport>>,
    session: Option<SessionManager>,
    context: ExecutionContext,
}

impl WardenClientBuilder {
    fn new() -> Self {
        Self {
            transport: None,
            session: None,
            context: ExecutionContext::Interactive,
        }
    }

    /// Set the HTTP transport (required)
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the session manager sharing this client's credentials (required)
    pub fn session(mut self, session: SessionManager) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the execution context (default: interactive)
    pub fn context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<WardenClient> {
        let transport = self
            .transport
            .ok_or_else(|| WardenLinkError::ConfigurationError("transport is required".into()))?;
        let session = self
            .session
            .ok_or_else(|| WardenLinkError::ConfigurationError("session is required".into()))?;

        // Seed the default header from persisted credentials, so a client
        // built after a restart resumes where the last one left off
        let bearer = session.bearer();
        if bearer.get().is_none() {
            if let Some(token) = session.token_store().get(ACCESS_TOKEN_KEY)? {
                bearer.set(token);
            }
        }

        let coordinator = Arc::new(RefreshCoordinator::new(
            Arc::clone(&transport),
            session,
            self.context,
        ));

        Ok(WardenClient {
            transport,
            bearer,
            coordinator,
        })
    }
}
