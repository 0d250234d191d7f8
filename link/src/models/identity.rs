use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Immutable snapshot of the authenticated user.
///
/// Replaced wholesale on every sign-in or profile reload; there are no
/// partial updates. Permissions and roles are sets of capability strings
/// (see [`crate::capability::allow`] for the matching grammar).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// Account email
    pub email: String,

    /// Granted permissions, `resource.action` or wildcard `resource.*`
    pub permissions: HashSet<String>,

    /// Granted roles
    pub roles: HashSet<String>,
}

impl Identity {
    /// Build an identity snapshot from owned parts
    pub fn new<P, R>(email: impl Into<String>, permissions: P, roles: R) -> Self
    where
        P: IntoIterator<Item = String>,
        R: IntoIterator<Item = String>,
    {
        Self {
            email: email.into(),
            permissions: permissions.into_iter().collect(),
            roles: roles.into_iter().collect(),
        }
    }
}
