//! Error types for warden-cli.
//!
//! Provides user-friendly error messages for common terminal-client
//! failures, wrapping the SDK's errors where they bubble up.

use std::fmt;

use warden_link::WardenLinkError;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug)]
pub enum CliError {
    /// Error from the warden-link library
    LinkError(WardenLinkError),

    /// Configuration or credentials-file error
    ConfigurationError(String),

    /// File I/O error
    FileError(String),

    /// Invalid command syntax
    ParseError(String),

    /// User cancelled the operation
    Cancelled,

    /// Readline error
    ReadlineError(String),
}

impl CliError {
    fn format_link_error(err: &WardenLinkError) -> String {
        match err {
            WardenLinkError::InvalidCredentials(msg) => format!("Sign-in failed: {}", msg),
            WardenLinkError::InvalidSession(msg) => format!("Session invalidated: {}", msg),
            WardenLinkError::RefreshFailed(msg) => format!("Session expired: {}", msg),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LinkError(e) => write!(f, "{}", Self::format_link_error(e)),
            CliError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            CliError::FileError(msg) => write!(f, "File error: {}", msg),
            CliError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            CliError::Cancelled => write!(f, "Operation cancelled"),
            CliError::ReadlineError(msg) => write!(f, "Input error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<WardenLinkError> for CliError {
    fn from(err: WardenLinkError) -> Self {
        CliError::LinkError(err)
    }
}

impl From<rustyline::error::ReadlineError> for CliError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        match err {
            rustyline::error::ReadlineError::Interrupted => CliError::Cancelled,
            rustyline::error::ReadlineError::Eof => CliError::Cancelled,
            e => CliError::ReadlineError(e.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::FileError(err.to_string())
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::ConfigurationError(format!("TOML parse error: {}", err))
    }
}
