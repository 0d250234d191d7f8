//! # warden-link
//!
//! Client-side session manager for Warden-protected applications.
//!
//! The library keeps the current authenticated identity, transparently
//! refreshes expired access tokens without losing in-flight requests,
//! propagates sign-in/sign-out across tabs, and gates UI and data access
//! by a grammar of permissions and roles.
//!
//! Three pieces do the real work:
//!
//! - [`coordinator::RefreshCoordinator`]: a single-flight refresh protocol
//!   that intercepts authorization failures, serializes concurrent refresh
//!   attempts, and replays or fails queued requests deterministically;
//! - [`session::SessionManager`]: the sign-in/sign-out lifecycle,
//!   cross-tab synchronization, and session bootstrap from persisted
//!   credentials;
//! - [`capability::allow`]: the pure permission/role matching algorithm
//!   behind both the [`guard::Gate`] conditional-render primitive and the
//!   route guards.
//!
//! # Quickstart
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use warden_link::models::Credentials;
//! use warden_link::{SessionManager, WardenClient};
//! use warden_link::transport::ReqwestTransport;
//!
//! # async fn example() -> warden_link::Result<()> {
//! let transport = Arc::new(ReqwestTransport::new("http://localhost:3333")?);
//!
//! let session = SessionManager::builder()
//!     .transport(transport.clone())
//!     .build()?;
//! let _listener = session.listen();
//! session.bootstrap().await?;
//!
//! let client = WardenClient::builder()
//!     .transport(transport)
//!     .session(session.clone())
//!     .build()?;
//!
//! session
//!     .sign_in(Credentials::new("a@b.com", "secret"))
//!     .await?;
//!
//! // Expired access tokens are refreshed and replayed transparently
//! let _reports: serde_json::Value = client.get_json("/reports").await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod bus;
pub mod capability;
pub mod client;
pub mod coordinator;
pub mod error;
pub mod guard;
pub mod models;
pub mod navigator;
pub mod session;
pub mod store;
pub mod transport;

pub use auth::BearerCell;
pub use bus::{AuthBus, AuthEvent, BroadcastAuthBus, BusMessage, AUTH_CHANNEL};
pub use capability::allow;
pub use client::{WardenClient, WardenClientBuilder};
pub use coordinator::{ExecutionContext, RefreshCoordinator};
pub use error::{Result, WardenLinkError};
pub use guard::{protect, guest_only, Gate, Guarded, RouteDecision};
pub use models::{Credentials, Identity};
pub use navigator::{Navigator, NoopNavigator, RecordingNavigator};
pub use session::{SessionManager, SessionManagerBuilder};
pub use store::{MemoryTokenStore, SessionTokens, TokenStore};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
