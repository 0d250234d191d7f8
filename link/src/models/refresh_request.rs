use serde::{Deserialize, Serialize};

/// Request body for `POST /refresh`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The refresh token currently held in the credential store
    pub refresh_token: String,
}
