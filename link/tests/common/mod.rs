//! Shared test harness: a scripted in-process backend implementing the
//! session endpoints, plus wiring helpers.
//!
//! The backend tracks which access/refresh token pair is currently valid.
//! Requests carrying a stale bearer get a 401 with the `token.expired`
//! code; `POST /refresh` rotates the pair (optionally after a delay, to
//! hold the refresh window open while other requests pile up) and counts
//! every call, so tests can assert the single-flight property.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use warden_link::coordinator::ExecutionContext;
use warden_link::transport::{ApiRequest, ApiResponse, HttpTransport};
use warden_link::{
    BroadcastAuthBus, MemoryTokenStore, RecordingNavigator, Result, SessionManager, WardenClient,
};

pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "correct-horse";

struct BackendState {
    valid_access: String,
    valid_refresh: String,
    generation: u32,
    revoked: bool,
    fail_refresh: bool,
}

pub struct FakeBackend {
    permissions: Vec<String>,
    roles: Vec<String>,
    refresh_delay: Option<Duration>,
    refresh_calls: AtomicUsize,
    state: Mutex<BackendState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            permissions: vec!["metrics.list".to_string()],
            roles: vec!["admin".to_string()],
            refresh_delay: None,
            refresh_calls: AtomicUsize::new(0),
            state: Mutex::new(BackendState {
                valid_access: "access-0".to_string(),
                valid_refresh: "refresh-0".to_string(),
                generation: 0,
                revoked: false,
                fail_refresh: false,
            }),
        }
    }

    pub fn with_capabilities(mut self, permissions: &[&str], roles: &[&str]) -> Self {
        self.permissions = permissions.iter().map(|p| p.to_string()).collect();
        self.roles = roles.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Delay `POST /refresh`, keeping the refresh window open so
    /// concurrent requests queue behind it
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }

    pub fn failing_refresh(self) -> Self {
        self.state.lock().unwrap().fail_refresh = true;
        self
    }

    /// Rotate the valid access token server-side; every token handed out
    /// so far becomes stale. The refresh token stays valid.
    pub fn invalidate_access(&self) {
        let mut state = self.state.lock().unwrap();
        state.generation += 1;
        state.valid_access = format!("access-{}", state.generation);
    }

    /// Make every authenticated endpoint answer with a non-expiry 401
    pub fn revoke_sessions(&self) {
        self.state.lock().unwrap().revoked = true;
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn valid_access(&self) -> String {
        self.state.lock().unwrap().valid_access.clone()
    }

    pub fn valid_refresh(&self) -> String {
        self.state.lock().unwrap().valid_refresh.clone()
    }

    fn authorize(&self, bearer: &Option<String>) -> Option<ApiResponse> {
        let state = self.state.lock().unwrap();
        if state.revoked {
            return Some(ApiResponse {
                status: 401,
                body: Some(json!({ "code": "session.revoked", "message": "session revoked" })),
            });
        }
        match bearer {
            Some(token) if *token == state.valid_access => None,
            _ => Some(ApiResponse {
                status: 401,
                body: Some(json!({ "code": "token.expired", "message": "access token expired" })),
            }),
        }
    }

    fn sign_in(&self, request: &ApiRequest) -> ApiResponse {
        let body = request.body.clone().unwrap_or(serde_json::Value::Null);
        let email = body.get("email").and_then(|v| v.as_str());
        let password = body.get("password").and_then(|v| v.as_str());

        if email == Some(EMAIL) && password == Some(PASSWORD) {
            let state = self.state.lock().unwrap();
            ApiResponse {
                status: 200,
                body: Some(json!({
                    "token": state.valid_access,
                    "refreshToken": state.valid_refresh,
                    "permissions": self.permissions,
                    "roles": self.roles,
                })),
            }
        } else {
            ApiResponse {
                status: 401,
                body: Some(json!({
                    "code": "credentials.invalid",
                    "message": "invalid email or password"
                })),
            }
        }
    }

    async fn refresh(&self, request: &ApiRequest) -> ApiResponse {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        let presented = request
            .body
            .as_ref()
            .and_then(|body| body.get("refreshToken"))
            .and_then(|token| token.as_str());

        if state.fail_refresh || presented != Some(state.valid_refresh.as_str()) {
            return ApiResponse {
                status: 401,
                body: Some(json!({
                    "code": "refresh.rejected",
                    "message": "refresh token revoked"
                })),
            };
        }

        state.generation += 1;
        state.valid_access = format!("access-{}", state.generation);
        state.valid_refresh = format!("refresh-{}", state.generation);
        ApiResponse {
            status: 200,
            body: Some(json!({
                "token": state.valid_access,
                "refreshToken": state.valid_refresh,
            })),
        }
    }
}

#[async_trait]
impl HttpTransport for FakeBackend {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        if request.method == Method::POST && request.path == "/sessions" {
            return Ok(self.sign_in(&request));
        }
        if request.method == Method::POST && request.path == "/refresh" {
            return Ok(self.refresh(&request).await);
        }
        if request.method == Method::GET && request.path == "/me" {
            return Ok(self.authorize(&request.bearer).unwrap_or_else(|| ApiResponse {
                status: 200,
                body: Some(json!({
                    "email": EMAIL,
                    "permissions": self.permissions,
                    "roles": self.roles,
                })),
            }));
        }
        if request.method == Method::GET {
            return Ok(self.authorize(&request.bearer).unwrap_or_else(|| ApiResponse {
                status: 200,
                body: Some(json!({
                    "path": request.path,
                    "data": format!("payload:{}", request.path),
                })),
            }));
        }
        Ok(ApiResponse {
            status: 404,
            body: None,
        })
    }
}

/// One fully wired "tab": shared backend, store, bus, plus its own
/// navigator, session manager and client.
pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub store: Arc<MemoryTokenStore>,
    pub bus: Arc<BroadcastAuthBus>,
    pub navigator: Arc<RecordingNavigator>,
    pub session: SessionManager,
    pub client: WardenClient,
}

pub fn harness(backend: FakeBackend) -> Harness {
    harness_with_context(backend, ExecutionContext::Interactive)
}

pub fn harness_with_context(backend: FakeBackend, context: ExecutionContext) -> Harness {
    // RUST_LOG=debug surfaces the [REFRESH]/[SESSION] traces when a test fails
    let _ = env_logger::builder().is_test(true).try_init();

    let backend = Arc::new(backend);
    let store = Arc::new(MemoryTokenStore::new());
    let bus = Arc::new(BroadcastAuthBus::new());
    let navigator = Arc::new(RecordingNavigator::new());

    let session = SessionManager::builder()
        .transport(backend.clone())
        .token_store(store.clone())
        .bus(bus.clone())
        .navigator(navigator.clone())
        .build()
        .expect("session wiring");

    let client = WardenClient::builder()
        .transport(backend.clone())
        .session(session.clone())
        .context(context)
        .build()
        .expect("client wiring");

    Harness {
        backend,
        store,
        bus,
        navigator,
        session,
        client,
    }
}
