//! # Access Subcommand
//!
//! Evaluates the route guard for the active session.

use anyhow::Result;
use clap::{Args, Subcommand};
use opsdesk_auth::{AccessGuard, Navigation, RouteTable};

use crate::config::ConsoleConfig;
use crate::{open_session, EXIT_DENIED};

/// Arguments for the `opsdesk access` subcommand.
#[derive(Args, Debug)]
pub struct AccessArgs {
    #[command(subcommand)]
    pub command: AccessCommand,
}

/// Access subcommands.
#[derive(Subcommand, Debug)]
pub enum AccessCommand {
    /// Decide whether the session may open a path.
    Check {
        /// Console path, e.g. `/gestor/reservas`.
        path: String,
    },
    /// List the routes the session may open.
    Menu,
}

/// Execute the access subcommand.
pub fn run_access(args: &AccessArgs, config: &ConsoleConfig) -> Result<u8> {
    let session = open_session(config)?;
    let routes = RouteTable::for_deployment(config.deployment);
    let guard = AccessGuard::new(&session, &routes);

    match &args.command {
        AccessCommand::Check { path } => match guard.navigate(path) {
            Navigation::Render(rule) => {
                println!("ALLOW: {path} ({})", rule.label);
                Ok(0)
            }
            Navigation::Redirect(target) => {
                println!("REDIRECT: {path} -> {target}");
                Ok(EXIT_DENIED)
            }
        },

        AccessCommand::Menu => {
            let menu = guard.menu();
            if menu.is_empty() {
                println!("No routes available (not logged in).");
                return Ok(EXIT_DENIED);
            }
            for rule in menu {
                println!("{:<14} {}", rule.path, rule.label);
            }
            Ok(0)
        }
    }
}
