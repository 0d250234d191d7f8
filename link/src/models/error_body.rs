use serde::{Deserialize, Serialize};

/// Error code the server attaches to a 401 caused by an expired access
/// token. Any other 401 is fatal to the session.
pub const TOKEN_EXPIRED_CODE: &str = "token.expired";

/// Structured error body attached to failed responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g. `token.expired`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Human-readable error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
