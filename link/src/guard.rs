//! UI gate and route guards.
//!
//! Thin consumers of the capability gate. [`Gate`] is the
//! conditional-render primitive: given an identity and a closure producing
//! children, it yields `Some(children)` iff the identity passes, else
//! `None` (render nothing). [`protect`] and [`guest_only`] are the
//! route-level decisions: deny by redirecting instead of by failing, to
//! the login page for unauthenticated visitors and to the forbidden page
//! for authenticated identities lacking a capability.
//!
//! Both surfaces call the same [`allow`] function, so a route and the UI
//! inside it can never disagree.

use crate::capability::allow;
use crate::error::Result;
use crate::models::Identity;
use crate::navigator::{AUTHENTICATED_LANDING, FORBIDDEN_DESTINATION, PUBLIC_LANDING};

/// Capability requirements guarding a piece of UI or a route
#[derive(Debug, Clone, Default)]
pub struct Gate {
    permissions: Vec<String>,
    roles: Vec<String>,
}

impl Gate {
    /// A gate with no requirements: authenticated users only
    pub fn new() -> Self {
        Self::default()
    }

    /// Require every one of these permissions
    pub fn permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Require at least one of these roles
    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `identity` passes this gate
    pub fn allows(&self, identity: Option<&Identity>) -> bool {
        allow(identity, &self.permissions, &self.roles)
    }

    /// Conditional render: `Some(children())` iff the identity passes,
    /// else `None`
    ///
    /// # Example
    /// ```
    /// use warden_link::guard::Gate;
    /// use warden_link::models::Identity;
    ///
    /// let identity = Identity::new(
    ///     "a@b.com",
    ///     vec!["metrics.list".to_string()],
    ///     vec![],
    /// );
    ///
    /// let gate = Gate::new().permissions(["metrics.list"]);
    /// assert_eq!(gate.render(Some(&identity), || "Metrics"), Some("Metrics"));
    ///
    /// let gate = Gate::new().permissions(["billing.write"]);
    /// assert_eq!(gate.render(Some(&identity), || "Billing"), None);
    /// ```
    pub fn render<T>(&self, identity: Option<&Identity>, children: impl FnOnce() -> T) -> Option<T> {
        if self.allows(identity) {
            Some(children())
        } else {
            None
        }
    }
}

/// Outcome of a route-level guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Run the route's loader
    Proceed,
    /// Skip the loader and send the user to this destination
    Redirect(String),
}

/// Guard a protected route.
///
/// Unauthenticated visitors are redirected to the public landing page
/// (the login form); authenticated identities that fail the gate are
/// redirected to the forbidden destination.
pub fn protect(identity: Option<&Identity>, gate: &Gate) -> RouteDecision {
    match identity {
        None => RouteDecision::Redirect(PUBLIC_LANDING.to_string()),
        Some(identity) if !gate.allows(Some(identity)) => {
            RouteDecision::Redirect(FORBIDDEN_DESTINATION.to_string())
        }
        Some(_) => RouteDecision::Proceed,
    }
}

/// Guard a guest-only route (the login page): authenticated users are
/// sent to the authenticated landing destination instead.
pub fn guest_only(identity: Option<&Identity>) -> RouteDecision {
    if identity.is_some() {
        RouteDecision::Redirect(AUTHENTICATED_LANDING.to_string())
    } else {
        RouteDecision::Proceed
    }
}

/// Result of a guarded data loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
    /// The gate passed; the loader ran
    Allowed(T),
    /// The gate denied; the loader never ran
    Redirected(String),
}

/// Wrap a route's data loader behind a gate.
///
/// The loader only runs when [`protect`] proceeds; a denial yields the
/// redirect destination without executing it.
pub async fn with_auth_guard<T, F, Fut>(
    identity: Option<&Identity>,
    gate: &Gate,
    loader: F,
) -> Result<Guarded<T>>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    match protect(identity, gate) {
        RouteDecision::Proceed => Ok(Guarded::Allowed(loader().await?)),
        RouteDecision::Redirect(destination) => Ok(Guarded::Redirected(destination)),
    }
}
