use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Successful sign-in response from `POST /sessions`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    /// Short-lived access token for API calls
    pub token: String,
    /// Longer-lived token used solely to obtain new access tokens
    pub refresh_token: String,
    /// Permissions granted to the account
    pub permissions: HashSet<String>,
    /// Roles granted to the account
    pub roles: HashSet<String>,
}
