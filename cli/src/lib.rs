//! Library entry point for warden-cli components.
//!
//! Exposes the reusable modules (file-backed token store, error types,
//! interactive session) so integration tests can exercise CLI behavior
//! without going through the binary entry point.

pub mod error;
pub mod file_store;
pub mod repl;

pub use error::{CliError, Result};
pub use file_store::FileTokenStore;
pub use repl::{CliSession, TerminalNavigator};
