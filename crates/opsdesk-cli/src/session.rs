//! # Session Subcommand
//!
//! - `login <token>` — persist a credential and print the resolved identity.
//! - `logout` — clear the session. Safe to repeat.
//! - `whoami` — print the current identity and its landing route.

use anyhow::Result;
use clap::{Args, Subcommand};
use opsdesk_auth::{IdentitySource, RouteTable};

use crate::config::ConsoleConfig;
use crate::{open_session, EXIT_DENIED};

/// Arguments for the `opsdesk session` subcommand.
#[derive(Args, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

/// Session subcommands.
#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Store a credential as the active session.
    Login {
        /// The bearer token returned by the login endpoint.
        token: String,
    },
    /// End the active session.
    Logout,
    /// Show the active identity.
    Whoami {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

/// Execute the session subcommand.
pub fn run_session(args: &SessionArgs, config: &ConsoleConfig) -> Result<u8> {
    let session = open_session(config)?;
    let routes = RouteTable::for_deployment(config.deployment);

    match &args.command {
        SessionCommand::Login { token } => match session.login(token) {
            Ok(identity) => {
                println!(
                    "OK: logged in as {} ({}) on {}",
                    identity.subject_id(),
                    identity.primary_role(),
                    config.deployment
                );
                println!("  Landing: {}", routes.landing_path(&identity));
                Ok(0)
            }
            Err(e) => {
                println!("DENIED: {e}");
                Ok(EXIT_DENIED)
            }
        },

        SessionCommand::Logout => {
            session.logout()?;
            println!("OK: logged out");
            Ok(0)
        }

        SessionCommand::Whoami { json } => {
            let Some(identity) = session.current_identity() else {
                println!("No active session.");
                return Ok(EXIT_DENIED);
            };
            if *json {
                println!("{}", serde_json::to_string_pretty(&identity)?);
                return Ok(0);
            }
            println!("Subject: {}", identity.subject_id());
            if let Some(name) = identity.display_name() {
                println!("  Name: {name}");
            }
            let roles: Vec<_> = identity.roles().iter().map(|r| r.as_str()).collect();
            println!("  Roles: {}", roles.join(", "));
            println!("  Primary: {}", identity.primary_role());
            println!("  Landing: {}", routes.landing_path(&identity));
            println!("  Facility: {}", session.deployment().title());
            Ok(0)
        }
    }
}
