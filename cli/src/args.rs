use clap::Parser;

/// Warden CLI - terminal client for Warden-protected services
#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(version)]
#[command(about = "Interactive session client for Warden services", long_about = None)]
pub struct Cli {
    /// Server URL (e.g. http://localhost:3333)
    #[arg(short = 'u', long = "url", default_value = "http://localhost:3333")]
    pub url: String,

    /// Named credential profile for on-disk token storage
    #[arg(long = "instance", default_value = "local")]
    pub instance: String,

    /// Use a throwaway in-memory token store instead of the credentials file
    #[arg(long = "ephemeral")]
    pub ephemeral: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}
