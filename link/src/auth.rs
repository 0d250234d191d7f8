//! Default outbound authorization state for warden clients.
//!
//! Every request issued through the client carries
//! `Authorization: Bearer <accessToken>`. The current token lives in a
//! shared [`BearerCell`]: seeded from the credential store when the client
//! is built, replaced on sign-in and on every successful refresh, cleared
//! on sign-out. The session state machine and the refresh coordinator hold
//! clones of the same cell, so a token rotation is visible to every
//! subsequent request immediately.

use std::sync::{Arc, RwLock};

/// Shared holder of the current bearer token.
///
/// Cheap to clone; all clones observe the same value.
#[derive(Debug, Clone, Default)]
pub struct BearerCell {
    token: Arc<RwLock<Option<String>>>,
}

impl BearerCell {
    /// Create an empty cell (requests go out without an Authorization
    /// header until a token is set)
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current token
    pub fn set(&self, token: impl Into<String>) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(token.into());
    }

    /// Drop the current token
    pub fn clear(&self) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    /// Read the current token, if any
    pub fn get(&self) -> Option<String> {
        let slot = self.token.read().unwrap_or_else(|e| e.into_inner());
        slot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_cell_set_clear() {
        let cell = BearerCell::new();
        assert_eq!(cell.get(), None);

        cell.set("acc-1");
        assert_eq!(cell.get(), Some("acc-1".to_string()));

        cell.set("acc-2");
        assert_eq!(cell.get(), Some("acc-2".to_string()));

        cell.clear();
        assert_eq!(cell.get(), None);
    }

    #[test]
    fn test_bearer_cell_clones_share_state() {
        let cell = BearerCell::new();
        let clone = cell.clone();

        cell.set("acc-1");
        assert_eq!(clone.get(), Some("acc-1".to_string()));

        clone.clear();
        assert_eq!(cell.get(), None);
    }
}
