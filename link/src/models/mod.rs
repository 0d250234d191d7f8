//! Data models for the warden-link client library.
//!
//! Defines the wire payloads of the session endpoints (`POST /sessions`,
//! `GET /me`, `POST /refresh`) and the in-memory identity snapshot.

pub mod credentials;
pub mod error_body;
pub mod identity;
pub mod profile_response;
pub mod refresh_grant;
pub mod refresh_request;
pub mod session_grant;
pub mod sign_in_request;

#[cfg(test)]
mod tests;

pub use credentials::Credentials;
pub use error_body::ErrorBody;
pub use identity::Identity;
pub use profile_response::ProfileResponse;
pub use refresh_grant::RefreshGrant;
pub use refresh_request::RefreshRequest;
pub use session_grant::SessionGrant;
pub use sign_in_request::SignInRequest;
