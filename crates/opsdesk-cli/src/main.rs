//! # opsdesk CLI entry point
//!
//! Parses arguments, resolves the layered configuration, and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use opsdesk_core::Deployment;
use tracing_subscriber::EnvFilter;

use opsdesk_cli::access::{run_access, AccessArgs};
use opsdesk_cli::config::{ConsoleConfig, Overrides};
use opsdesk_cli::decode::{run_decode, DecodeArgs};
use opsdesk_cli::session::{run_session, SessionArgs};
use opsdesk_cli::workflow::{run_workflow, WorkflowArgs};

/// Operations console core.
///
/// Manages the console session, checks route access by role, and runs the
/// reservation and appointment workflows locally.
#[derive(Parser, Debug)]
#[command(name = "opsdesk", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Facility variant (`innovation-center` or `clinic`).
    #[arg(long, global = true)]
    deployment: Option<Deployment>,

    /// Directory holding the persisted session.
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in, log out, and inspect the session.
    Session(SessionArgs),

    /// Check route access for the current session.
    Access(AccessArgs),

    /// Reservation and appointment workflow operations.
    Workflow(WorkflowArgs),

    /// Inspect a credential without logging in.
    Decode(DecodeArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let overrides = Overrides {
        deployment: cli.deployment,
        state_dir: cli.state_dir.clone(),
    };
    let config = match ConsoleConfig::resolve(cli.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };

    let result = match &cli.command {
        Commands::Session(args) => run_session(args, &config),
        Commands::Access(args) => run_access(args, &config),
        Commands::Workflow(args) => run_workflow(args, &config),
        Commands::Decode(args) => run_decode(args, &config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_cli::access::AccessCommand;
    use opsdesk_cli::session::SessionCommand;
    use opsdesk_cli::workflow::{EntityKind, WorkflowCommand};

    #[test]
    fn parse_session_login() {
        let cli = Cli::try_parse_from(["opsdesk", "session", "login", "a.b.c"]).unwrap();
        match cli.command {
            Commands::Session(args) => {
                assert!(matches!(args.command, SessionCommand::Login { token } if token == "a.b.c"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "opsdesk",
            "access",
            "check",
            "/medico",
            "--deployment",
            "clinic",
            "--state-dir",
            "/tmp/s",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.deployment, Some(Deployment::Clinic));
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/s")));
        assert!(matches!(
            cli.command,
            Commands::Access(AccessArgs { command: AccessCommand::Check { .. } })
        ));
    }

    #[test]
    fn parse_unknown_deployment_fails() {
        assert!(Cli::try_parse_from(["opsdesk", "--deployment", "hospital", "access", "menu"]).is_err());
    }

    #[test]
    fn parse_workflow_transition() {
        let cli = Cli::try_parse_from([
            "opsdesk",
            "workflow",
            "transition",
            "--entity",
            "r.json",
            "--kind",
            "reservation",
            "--to",
            "REJECTED",
            "--reason",
            "overlap",
        ])
        .unwrap();
        let Commands::Workflow(args) = cli.command else {
            panic!("expected workflow command");
        };
        match args.command {
            WorkflowCommand::Transition {
                entity,
                kind,
                to,
                reason,
            } => {
                assert_eq!(entity, PathBuf::from("r.json"));
                assert_eq!(kind, EntityKind::Reservation);
                assert_eq!(to, "REJECTED");
                assert_eq!(reason.as_deref(), Some("overlap"));
            }
            other => panic!("unexpected workflow command: {other:?}"),
        }
    }

    #[test]
    fn parse_workflow_requires_kind() {
        assert!(
            Cli::try_parse_from(["opsdesk", "workflow", "actions", "--entity", "a.json"]).is_err()
        );
    }

    #[test]
    fn parse_decode() {
        let cli = Cli::try_parse_from(["opsdesk", "decode", "x.y.z"]).unwrap();
        assert!(matches!(cli.command, Commands::Decode(DecodeArgs { token }) if token == "x.y.z"));
    }
}
