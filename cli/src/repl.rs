//! Interactive CLI session.
//!
//! A small readline loop over the warden-link SDK: sign in, inspect the
//! current identity, probe the capability gate, fetch protected resources
//! (exercising the transparent token refresh), and sign out.

use colored::*;
use rustyline::DefaultEditor;

use warden_link::guard::Gate;
use warden_link::models::Credentials;
use warden_link::{Navigator, SessionManager, WardenClient, WardenLinkError};

use crate::error::{CliError, Result};

/// Navigator that reports destination changes on the terminal
#[derive(Debug, Default)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn push(&self, destination: &str) {
        println!("{}", format!("→ {}", destination).dimmed());
    }
}

/// One parsed REPL command
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Login { email: String },
    Logout,
    WhoAmI,
    Can { permissions: Vec<String>, roles: Vec<String> },
    Get { path: String },
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };

    match command {
        "login" => {
            let email = words
                .next()
                .ok_or_else(|| CliError::ParseError("usage: login <email>".into()))?;
            Ok(Some(Command::Login {
                email: email.to_string(),
            }))
        }
        "logout" => Ok(Some(Command::Logout)),
        "whoami" => Ok(Some(Command::WhoAmI)),
        "can" => {
            let mut permissions = Vec::new();
            let mut roles = Vec::new();
            while let Some(word) = words.next() {
                if word == "--role" {
                    let role = words
                        .next()
                        .ok_or_else(|| CliError::ParseError("--role needs a value".into()))?;
                    roles.push(role.to_string());
                } else {
                    permissions.push(word.to_string());
                }
            }
            Ok(Some(Command::Can { permissions, roles }))
        }
        "get" => {
            let path = words
                .next()
                .ok_or_else(|| CliError::ParseError("usage: get <path>".into()))?;
            if !path.starts_with('/') {
                return Err(CliError::ParseError("path must start with '/'".into()));
            }
            Ok(Some(Command::Get {
                path: path.to_string(),
            }))
        }
        "help" => Ok(Some(Command::Help)),
        "quit" | "exit" => Ok(Some(Command::Quit)),
        other => Err(CliError::ParseError(format!(
            "unknown command '{}' (try 'help')",
            other
        ))),
    }
}

/// Interactive session over one server connection
pub struct CliSession {
    session: SessionManager,
    client: WardenClient,
}

impl CliSession {
    /// Create a CLI session around a wired session manager and client
    pub fn new(session: SessionManager, client: WardenClient) -> Self {
        Self { session, client }
    }

    fn prompt(&self) -> String {
        match self.session.identity() {
            Some(identity) => format!("warden ({})> ", identity.email),
            None => "warden> ".to_string(),
        }
    }

    /// Run the readline loop until `quit` or EOF
    pub async fn run_interactive(&mut self) -> Result<()> {
        println!("Type 'help' for available commands.");
        let mut editor = DefaultEditor::new().map_err(CliError::from)?;

        loop {
            let line = match editor.readline(&self.prompt()) {
                Ok(line) => line,
                Err(rustyline::error::ReadlineError::Interrupted)
                | Err(rustyline::error::ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let _ = editor.add_history_entry(trimmed);

            match parse_command(trimmed) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    if let Err(e) = self.execute(command).await {
                        eprintln!("{}", e.to_string().red());
                    }
                }
                Ok(None) => {}
                Err(e) => eprintln!("{}", e.to_string().red()),
            }
        }

        Ok(())
    }

    async fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Login { email } => self.login(&email).await,
            Command::Logout => {
                self.session.sign_out()?;
                println!("{}", "Signed out.".green());
                Ok(())
            }
            Command::WhoAmI => {
                match self.session.identity() {
                    Some(identity) => {
                        println!("{} {}", "email:".bold(), identity.email);
                        let mut permissions: Vec<_> =
                            identity.permissions.iter().cloned().collect();
                        permissions.sort();
                        println!("{} {}", "permissions:".bold(), permissions.join(", "));
                        let mut roles: Vec<_> = identity.roles.iter().cloned().collect();
                        roles.sort();
                        println!("{} {}", "roles:".bold(), roles.join(", "));
                    }
                    None => println!("{}", "Not signed in.".yellow()),
                }
                Ok(())
            }
            Command::Can { permissions, roles } => {
                let gate = Gate::new().permissions(permissions).roles(roles);
                let identity = self.session.identity();
                if gate.allows(identity.as_ref()) {
                    println!("{}", "allowed".green());
                } else {
                    println!("{}", "denied".red());
                }
                Ok(())
            }
            Command::Get { path } => {
                let payload: serde_json::Value = self.client.get_json(&path).await?;
                println!(
                    "{}",
                    serde_json::to_string_pretty(&payload)
                        .unwrap_or_else(|_| payload.to_string())
                );
                Ok(())
            }
            Command::Help => {
                println!("Commands:");
                println!("  login <email>                    sign in (prompts for password)");
                println!("  logout                           sign out everywhere");
                println!("  whoami                           show the current identity");
                println!("  can <perm>... [--role <role>]    probe the capability gate");
                println!("  get <path>                       fetch a protected resource");
                println!("  quit                             leave");
                Ok(())
            }
            // Handled by the loop
            Command::Quit => Ok(()),
        }
    }

    async fn login(&mut self, email: &str) -> Result<()> {
        let password = rpassword::prompt_password("Password: ")
            .map_err(|e| CliError::ReadlineError(e.to_string()))?;

        match self
            .session
            .sign_in(Credentials::new(email, password))
            .await
        {
            Ok(identity) => {
                println!("{}", format!("Signed in as {}.", identity.email).green());
                Ok(())
            }
            Err(WardenLinkError::InvalidCredentials(message)) => {
                // The form stays on screen: no navigation, no state change
                eprintln!("{}", format!("Sign-in failed: {}", message).red());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_requires_email() {
        assert!(parse_command("login").is_err());
        assert_eq!(
            parse_command("login a@b.com").unwrap(),
            Some(Command::Login {
                email: "a@b.com".to_string()
            })
        );
    }

    #[test]
    fn test_parse_can_splits_permissions_and_roles() {
        let command = parse_command("can metrics.list billing.read --role admin --role editor")
            .unwrap()
            .unwrap();
        assert_eq!(
            command,
            Command::Can {
                permissions: vec!["metrics.list".to_string(), "billing.read".to_string()],
                roles: vec!["admin".to_string(), "editor".to_string()],
            }
        );

        assert!(parse_command("can metrics.list --role").is_err());
    }

    #[test]
    fn test_parse_get_requires_absolute_path() {
        assert!(parse_command("get reports").is_err());
        assert_eq!(
            parse_command("get /reports").unwrap(),
            Some(Command::Get {
                path: "/reports".to_string()
            })
        );
    }

    #[test]
    fn test_parse_empty_and_unknown_lines() {
        assert_eq!(parse_command("   ").unwrap(), None);
        assert!(parse_command("frobnicate").is_err());
    }
}
