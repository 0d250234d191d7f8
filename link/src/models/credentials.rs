/// Sign-in input: email and password.
///
/// Transient by design. Never persisted, never logged; the only consumer
/// is [`crate::session::SessionManager::sign_in`].
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    /// Create sign-in credentials
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}
