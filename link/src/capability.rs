//! Capability gate: the permission/role matching algorithm.
//!
//! A pure decision over (identity, required permissions, required roles).
//! The same function backs the conditional-render gate and the route
//! guards, so UI and data access can never disagree about what an
//! identity may see.
//!
//! A permission string has the form `resource.action`. An identity
//! satisfies a required permission when its permission set contains the
//! exact string, or the wildcard form `resource.*`. Roles are any-of:
//! holding one of the required roles is enough, and an empty role
//! requirement passes trivially. Empty requirements on both axes mean
//! "authenticated users only".

use crate::models::Identity;

/// Decide whether `identity` may access a resource guarded by the given
/// permission and role requirements.
///
/// Total and deterministic: identical inputs always yield identical
/// output, with no environment-dependent branching.
///
/// # Example
/// ```
/// use warden_link::capability::allow;
/// use warden_link::models::Identity;
///
/// let identity = Identity::new(
///     "a@b.com",
///     vec!["metrics.*".to_string()],
///     vec!["admin".to_string()],
/// );
///
/// assert!(allow(Some(&identity), &["metrics.list"], &[] as &[&str]));
/// assert!(!allow(Some(&identity), &["billing.write"], &[] as &[&str]));
/// assert!(!allow(None, &[] as &[&str], &[] as &[&str]));
/// ```
pub fn allow<P, R>(identity: Option<&Identity>, required_permissions: &[P], required_roles: &[R]) -> bool
where
    P: AsRef<str>,
    R: AsRef<str>,
{
    let Some(identity) = identity else {
        return false;
    };

    let permissions_satisfied = required_permissions.iter().all(|required| {
        let required = required.as_ref();
        identity.permissions.contains(required)
            || wildcard_of(required)
                .map(|wildcard| identity.permissions.contains(&wildcard))
                .unwrap_or(false)
    });

    let roles_satisfied = required_roles.is_empty()
        || required_roles
            .iter()
            .any(|role| identity.roles.contains(role.as_ref()));

    permissions_satisfied && roles_satisfied
}

/// Wildcard form of a `resource.action` permission (`resource.*`), or
/// `None` when the permission has no `.` separator
fn wildcard_of(permission: &str) -> Option<String> {
    permission
        .rsplit_once('.')
        .map(|(resource, _)| format!("{}.*", resource))
}
