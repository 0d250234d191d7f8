//! Navigation sink.
//!
//! The session lifecycle moves the user between three destinations: the
//! public landing page after sign-out or an invalidated session, the
//! authenticated landing page after sign-in, and the forbidden page when a
//! route guard denies an authenticated identity. What "navigating" means
//! is up to the host (a router, a redirect, a prompt change in a terminal
//! client), so the sink is an injected trait.

use std::sync::Mutex;

/// Destination after sign-out or session invalidation
pub const PUBLIC_LANDING: &str = "/";

/// Destination after sign-in
pub const AUTHENTICATED_LANDING: &str = "/dashboard";

/// Destination when an authenticated identity lacks a required capability
pub const FORBIDDEN_DESTINATION: &str = "/forbidden";

/// Host navigation callback
pub trait Navigator: Send + Sync {
    /// Move the user to `destination`
    fn push(&self, destination: &str);
}

/// Navigator that goes nowhere, for hosts without a navigation concept
#[derive(Debug, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn push(&self, _destination: &str) {}
}

/// Navigator that records destinations, for tests and headless use
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    destinations: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    /// Create an empty recording navigator
    pub fn new() -> Self {
        Self::default()
    }

    /// Every destination pushed so far, in order
    pub fn destinations(&self) -> Vec<String> {
        self.destinations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The most recent destination, if any
    pub fn current(&self) -> Option<String> {
        self.destinations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn push(&self, destination: &str) {
        self.destinations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(destination.to_string());
    }
}
