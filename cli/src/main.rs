//! Warden CLI - terminal client for Warden-protected services
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode against a local server
//! warden -u http://localhost:3333
//!
//! # Separate credential profile, tokens kept only in memory
//! warden -u https://api.example.com --instance production --ephemeral
//! ```
//!
//! The session bootstraps from the credentials file on startup, so a
//! restarted CLI resumes where the last one left off; an expired access
//! token is refreshed transparently on the first `get`.

use std::sync::Arc;

use clap::Parser;
use colored::*;

use warden_cli::{CliSession, FileTokenStore, Result, TerminalNavigator};
use warden_link::transport::ReqwestTransport;
use warden_link::{
    BroadcastAuthBus, MemoryTokenStore, SessionManager, TokenStore, WardenClient,
};

mod args;

use args::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .init();
    } else {
        env_logger::init();
    }

    let transport = Arc::new(ReqwestTransport::new(cli.url.clone())?);

    let store: Arc<dyn TokenStore> = if cli.ephemeral {
        Arc::new(MemoryTokenStore::new())
    } else {
        Arc::new(FileTokenStore::new(&cli.instance)?)
    };

    let session = SessionManager::builder()
        .transport(transport.clone())
        .token_store(store)
        .bus(Arc::new(BroadcastAuthBus::new()))
        .navigator(Arc::new(TerminalNavigator))
        .build()?;

    // Other warden processes sharing the bus can end this session too
    let _listener = session.listen();

    println!("Connecting to {}", cli.url.bold());
    match session.bootstrap().await? {
        Some(identity) => println!("{}", format!("Resumed session for {}.", identity.email).green()),
        None => println!("{}", "No active session. Use 'login <email>' to sign in.".dimmed()),
    }

    let client = WardenClient::builder()
        .transport(transport)
        .session(session.clone())
        .build()?;

    let mut repl = CliSession::new(session, client);
    repl.run_interactive().await
}
