use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::identity::Identity;

/// Profile payload from `GET /me`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    /// Account email
    pub email: String,
    /// Permissions granted to the account
    pub permissions: HashSet<String>,
    /// Roles granted to the account
    pub roles: HashSet<String>,
}

impl From<ProfileResponse> for Identity {
    fn from(profile: ProfileResponse) -> Self {
        Identity {
            email: profile.email,
            permissions: profile.permissions,
            roles: profile.roles,
        }
    }
}
