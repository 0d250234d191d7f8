use serde::{Deserialize, Serialize};

/// Sign-in request body for `POST /sessions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}
