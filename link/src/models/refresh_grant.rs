use serde::{Deserialize, Serialize};

/// Rotated token pair from `POST /refresh`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshGrant {
    /// New access token
    pub token: String,
    /// New refresh token, replacing the one sent in the request
    pub refresh_token: String,
}
