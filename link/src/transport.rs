//! HTTP transport boundary.
//!
//! The session manager and the refresh coordinator treat the network as an
//! opaque request/response surface: [`HttpTransport`] takes an
//! [`ApiRequest`] and yields an [`ApiResponse`] in which non-2xx statuses
//! are data, not errors. The refresh coordinator has to inspect 401
//! bodies, so the transport must never swallow them. Only genuine
//! network-level failures (connect, timeout) surface as `Err`.
//!
//! [`ReqwestTransport`] is the production implementation; tests substitute
//! a scripted one.

use async_trait::async_trait;
use log::debug;
use reqwest::Method;

use crate::error::{Result, WardenLinkError};

/// Path of the sign-in endpoint (`POST`)
pub const SESSIONS_PATH: &str = "/sessions";

/// Path of the profile endpoint (`GET`)
pub const PROFILE_PATH: &str = "/me";

/// Path of the token refresh endpoint (`POST`)
pub const REFRESH_PATH: &str = "/refresh";

/// One outbound API request.
///
/// Carries everything needed to (re-)issue the call, so a request that
/// stalls on a pending refresh can be replayed with a new token.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the transport's base URL (e.g. `/me`)
    pub path: String,
    /// Optional JSON body
    pub body: Option<serde_json::Value>,
    /// Bearer token for the `Authorization` header, if any
    pub bearer: Option<String>,
}

impl ApiRequest {
    /// Build a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    /// Build a POST request with a JSON body
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
            bearer: None,
        }
    }

    /// Attach (or replace) the bearer token
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// One inbound API response: status plus parsed JSON body, if any
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// JSON body, when the server sent one
    pub body: Option<serde_json::Value>,
}

impl ApiResponse {
    /// `true` for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The structured error code in the body, if present
    pub fn error_code(&self) -> Option<&str> {
        self.body.as_ref()?.get("code")?.as_str()
    }

    /// The error message in the body, or a fallback naming the status
    pub fn error_message(&self) -> String {
        self.body
            .as_ref()
            .and_then(|body| body.get("message"))
            .and_then(|message| message.as_str())
            .map(|message| message.to_string())
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }

    /// Deserialize the body into `T`
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        let body = self.body.clone().unwrap_or(serde_json::Value::Null);
        Ok(serde_json::from_value(body)?)
    }
}

/// Async boundary to the HTTP layer.
///
/// Production code uses [`ReqwestTransport`]; tests inject a scripted
/// implementation to drive the refresh protocol deterministically.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one request and return the response.
    ///
    /// Non-2xx statuses are returned as `Ok`; only transport-level
    /// failures are `Err`.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Production transport over a pooled [`reqwest::Client`]
pub struct ReqwestTransport {
    base_url: String,
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport for the given base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            // Keep-alive connections reduce TCP handshake overhead on the
            // retry-after-refresh path
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()
            .map_err(|e| WardenLinkError::ConfigurationError(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into(),
            http_client,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!("[HTTP] {} {}", request.method, url);

        let mut builder = self.http_client.request(request.method.clone(), &url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let body = if text.is_empty() {
            None
        } else {
            serde_json::from_str(&text).ok()
        };

        debug!("[HTTP] response status={}", status);
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_error_accessors() {
        let response = ApiResponse {
            status: 401,
            body: Some(serde_json::json!({
                "code": "token.expired",
                "message": "access token expired"
            })),
        };

        assert!(!response.is_success());
        assert_eq!(response.error_code(), Some("token.expired"));
        assert_eq!(response.error_message(), "access token expired");
    }

    #[test]
    fn test_api_response_fallback_message() {
        let response = ApiResponse {
            status: 500,
            body: None,
        };

        assert_eq!(response.error_code(), None);
        assert_eq!(response.error_message(), "HTTP 500");
    }

    #[test]
    fn test_api_request_with_bearer_replaces_token() {
        let request = ApiRequest::get("/me").with_bearer("old");
        let request = request.with_bearer("new");
        assert_eq!(request.bearer.as_deref(), Some("new"));
    }
}
