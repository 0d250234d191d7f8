//! Cross-tab auth broadcast bus.
//!
//! Sign-in and sign-out are propagated between open tabs over a shared
//! channel named for the auth domain, carrying the string payloads
//! `"signIn"` and `"signOut"` only. The bus is an injected interface so
//! tests (and non-browser hosts) can substitute an in-process one.
//!
//! A browser BroadcastChannel does not deliver a message back to the tab
//! that posted it; the in-process bus does. Messages therefore carry the
//! origin tab id, and listeners skip their own broadcasts.

use tokio::sync::broadcast;

/// Name of the shared auth channel
pub const AUTH_CHANNEL: &str = "auth";

/// Identifier of one session manager instance ("tab")
pub type TabId = u64;

/// Auth lifecycle events carried over the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// A tab completed sign-in
    SignedIn,
    /// A tab signed out
    SignedOut,
}

impl AuthEvent {
    /// The wire payload of this event
    pub fn payload(&self) -> &'static str {
        match self {
            AuthEvent::SignedIn => "signIn",
            AuthEvent::SignedOut => "signOut",
        }
    }

    /// Parse a wire payload. Unrecognized payloads yield `None` and are
    /// ignored by listeners.
    pub fn parse(payload: &str) -> Option<Self> {
        match payload {
            "signIn" => Some(AuthEvent::SignedIn),
            "signOut" => Some(AuthEvent::SignedOut),
            _ => None,
        }
    }
}

/// One message on the auth channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Tab that posted the message
    pub origin: TabId,
    /// String payload (`"signIn"`, `"signOut"`, or unrecognized)
    pub payload: String,
}

impl BusMessage {
    /// Build a message for an auth event
    pub fn event(origin: TabId, event: AuthEvent) -> Self {
        Self {
            origin,
            payload: event.payload().to_string(),
        }
    }
}

/// Injected broadcast interface.
///
/// `publish` never fails: a channel with no listeners simply drops the
/// message, like a BroadcastChannel with no other open tab.
pub trait AuthBus: Send + Sync {
    /// Channel name (the auth domain)
    fn name(&self) -> &str;

    /// Post a message to every subscriber
    fn publish(&self, message: BusMessage);

    /// Open a new subscription handle
    fn subscribe(&self) -> broadcast::Receiver<BusMessage>;
}

/// In-process bus over a tokio broadcast channel
pub struct BroadcastAuthBus {
    name: String,
    sender: broadcast::Sender<BusMessage>,
}

impl BroadcastAuthBus {
    /// Create the standard `"auth"` channel
    pub fn new() -> Self {
        Self::with_name(AUTH_CHANNEL)
    }

    /// Create a channel with a custom name
    pub fn with_name(name: impl Into<String>) -> Self {
        let (sender, _) = broadcast::channel(16);
        Self {
            name: name.into(),
            sender,
        }
    }
}

impl Default for BroadcastAuthBus {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthBus for BroadcastAuthBus {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, message: BusMessage) {
        // A send error only means there is no listening tab
        let _ = self.sender.send(message);
    }

    fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_payload_round_trip() {
        assert_eq!(AuthEvent::parse("signIn"), Some(AuthEvent::SignedIn));
        assert_eq!(AuthEvent::parse("signOut"), Some(AuthEvent::SignedOut));
        assert_eq!(AuthEvent::parse("renew"), None);
        assert_eq!(AuthEvent::parse(""), None);

        assert_eq!(AuthEvent::SignedIn.payload(), "signIn");
        assert_eq!(AuthEvent::SignedOut.payload(), "signOut");
    }

    #[tokio::test]
    async fn test_broadcast_bus_delivers_to_subscribers() {
        let bus = BroadcastAuthBus::new();
        assert_eq!(bus.name(), AUTH_CHANNEL);

        let mut rx = bus.subscribe();
        bus.publish(BusMessage::event(1, AuthEvent::SignedOut));

        let message = rx.recv().await.unwrap();
        assert_eq!(message.origin, 1);
        assert_eq!(message.payload, "signOut");
    }

    #[test]
    fn test_publish_without_subscribers_is_a_no_op() {
        let bus = BroadcastAuthBus::new();
        bus.publish(BusMessage::event(1, AuthEvent::SignedIn));
    }
}
