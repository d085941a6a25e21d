//! # Workflow Subcommand
//!
//! Runs the workflow engine against entity documents stored as JSON files,
//! using the role set of the active session. Accepted changes are written
//! back to the file and the backend call that would follow is printed.
//!
//! ## Subcommands
//!
//! - `transition` — change status (`--to APPROVED`, `--reason ...`).
//! - `withdraw` — delete a request still in its initial status.
//! - `actions` — list what the session may do with an entity.
//! - `finalize` — close an approved reservation whose window has ended.
//! - `create` — validate a draft and plan its creation.
//! - `list` — plan a listing, optionally filtered by status.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use opsdesk_auth::{Identity, IdentitySource};
use opsdesk_core::{Role, Timestamp};
use opsdesk_state::{
    allowed_actions, finalize_elapsed, list_request, plan_create, plan_transition,
    plan_withdrawal, Appointment, AppointmentDraft, EntityDraft, Reservation, ReservationDraft,
    WorkflowEntity, WorkflowError,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ConsoleConfig;
use crate::{open_session, EXIT_DENIED};

/// Entity family selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    /// Resource reservations.
    Reservation,
    /// Clinic appointments.
    Appointment,
}

/// Arguments for the `opsdesk workflow` subcommand.
#[derive(Args, Debug)]
pub struct WorkflowArgs {
    #[command(subcommand)]
    pub command: WorkflowCommand,
}

/// Workflow subcommands.
#[derive(Subcommand, Debug)]
pub enum WorkflowCommand {
    /// Move an entity to a new status.
    Transition {
        /// Entity JSON file; rewritten on success.
        #[arg(long)]
        entity: PathBuf,
        /// Entity family.
        #[arg(long, value_enum)]
        kind: EntityKind,
        /// Target status (English or backend name).
        #[arg(long)]
        to: String,
        /// Reason, for targets that require one.
        #[arg(long)]
        reason: Option<String>,
    },

    /// Withdraw a request in its initial status; removes the file on success.
    Withdraw {
        /// Entity JSON file.
        #[arg(long)]
        entity: PathBuf,
        /// Entity family.
        #[arg(long, value_enum)]
        kind: EntityKind,
    },

    /// List the actions the session may perform.
    Actions {
        /// Entity JSON file.
        #[arg(long)]
        entity: PathBuf,
        /// Entity family.
        #[arg(long, value_enum)]
        kind: EntityKind,
    },

    /// Finalize an approved reservation whose window has ended.
    Finalize {
        /// Reservation JSON file; rewritten when finalized.
        #[arg(long)]
        entity: PathBuf,
        /// Evaluation instant (RFC 3339); defaults to now.
        #[arg(long)]
        at: Option<String>,
    },

    /// Validate a creation draft and print the request.
    Create {
        /// Draft JSON file.
        #[arg(long)]
        draft: PathBuf,
        /// Entity family.
        #[arg(long, value_enum)]
        kind: EntityKind,
    },

    /// Print the listing request for a family.
    List {
        /// Entity family.
        #[arg(long, value_enum)]
        kind: EntityKind,
        /// Only entities in this status.
        #[arg(long)]
        status: Option<String>,
    },
}

/// Execute the workflow subcommand.
pub fn run_workflow(args: &WorkflowArgs, config: &ConsoleConfig) -> Result<u8> {
    let session = open_session(config)?;
    let Some(identity) = session.current_identity() else {
        println!("DENIED: no active session; run `opsdesk session login` first");
        return Ok(EXIT_DENIED);
    };
    let roles = identity.roles();

    match &args.command {
        WorkflowCommand::Transition {
            entity,
            kind,
            to,
            reason,
        } => match kind {
            EntityKind::Reservation => {
                cmd_transition::<Reservation>(entity, to, roles, reason.as_deref())
            }
            EntityKind::Appointment => {
                cmd_transition::<Appointment>(entity, to, roles, reason.as_deref())
            }
        },

        WorkflowCommand::Withdraw { entity, kind } => match kind {
            EntityKind::Reservation => cmd_withdraw::<Reservation>(entity, roles),
            EntityKind::Appointment => cmd_withdraw::<Appointment>(entity, roles),
        },

        WorkflowCommand::Actions { entity, kind } => match kind {
            EntityKind::Reservation => cmd_actions::<Reservation>(entity, &identity),
            EntityKind::Appointment => cmd_actions::<Appointment>(entity, &identity),
        },

        WorkflowCommand::Finalize { entity, at } => cmd_finalize(entity, at.as_deref()),

        WorkflowCommand::Create { draft, kind } => match kind {
            EntityKind::Reservation => cmd_create::<ReservationDraft>(draft, roles),
            EntityKind::Appointment => cmd_create::<AppointmentDraft>(draft, roles),
        },

        WorkflowCommand::List { kind, status } => match kind {
            EntityKind::Reservation => cmd_list::<Reservation>(status.as_deref()),
            EntityKind::Appointment => cmd_list::<Appointment>(status.as_deref()),
        },
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid document: {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

fn parse_status<S: FromStr<Err = String>>(raw: &str) -> Result<S> {
    raw.parse().map_err(anyhow::Error::msg)
}

fn cmd_transition<E>(path: &Path, to: &str, roles: &[Role], reason: Option<&str>) -> Result<u8>
where
    E: WorkflowEntity + Serialize + DeserializeOwned,
    E::Status: FromStr<Err = String>,
{
    let entity: E = read_json(path)?;
    let target: E::Status = parse_status(to)?;
    let from = entity.status();

    match plan_transition(&entity, target, roles, reason) {
        Ok((next, request)) => {
            write_json(path, &next)?;
            println!("OK: {} {} {from} → {target}", E::COLLECTION, entity.id());
            println!("  Request: {request}");
            Ok(0)
        }
        Err(e) => {
            println!("DENIED: {e}");
            Ok(EXIT_DENIED)
        }
    }
}

fn cmd_withdraw<E>(path: &Path, roles: &[Role]) -> Result<u8>
where
    E: WorkflowEntity + DeserializeOwned,
{
    let entity: E = read_json(path)?;
    match plan_withdrawal(&entity, roles) {
        Ok(request) => {
            std::fs::remove_file(path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
            println!("OK: {} {} withdrawn", E::COLLECTION, entity.id());
            println!("  Request: {request}");
            Ok(0)
        }
        Err(e) => {
            println!("DENIED: {e}");
            Ok(EXIT_DENIED)
        }
    }
}

fn cmd_actions<E>(path: &Path, identity: &Identity) -> Result<u8>
where
    E: WorkflowEntity + DeserializeOwned,
{
    let entity: E = read_json(path)?;
    let actions = allowed_actions(&entity, identity.roles());

    println!("{} {} [{}]", E::COLLECTION, entity.id(), entity.status());
    if actions.is_empty() {
        println!("  (no actions available)");
    }
    for offered in actions {
        let target = offered
            .target
            .map(|t| t.to_string())
            .unwrap_or_else(|| "deleted".to_string());
        let note = if offered.requires_reason { " (reason required)" } else { "" };
        println!("  {:<14} → {target}{note}", offered.action.as_str());
    }
    Ok(0)
}

fn cmd_finalize(path: &Path, at: Option<&str>) -> Result<u8> {
    let reservation: Reservation = read_json(path)?;
    let now = match at {
        Some(raw) => Timestamp::parse(raw).context("invalid --at")?,
        None => Timestamp::now(),
    };

    match finalize_elapsed(&reservation, now) {
        Some(finalized) => {
            write_json(path, &finalized)?;
            println!("OK: reservation {} finalized", reservation.id());
        }
        None => println!(
            "UNCHANGED: reservation {} is {} and ends {}",
            reservation.id(),
            reservation.status(),
            reservation.ends_at()
        ),
    }
    Ok(0)
}

fn cmd_create<D>(path: &Path, roles: &[Role]) -> Result<u8>
where
    D: EntityDraft + DeserializeOwned,
{
    let draft: D = read_json(path)?;
    match plan_create(&draft, roles) {
        Ok(request) => {
            println!("OK: draft accepted");
            println!("  Request: {request}");
            Ok(0)
        }
        Err(e @ WorkflowError::CreationForbidden { .. }) => {
            println!("DENIED: {e}");
            Ok(EXIT_DENIED)
        }
        Err(e) => bail!("invalid draft {}: {e}", path.display()),
    }
}

fn cmd_list<E>(status: Option<&str>) -> Result<u8>
where
    E: WorkflowEntity,
    E::Status: FromStr<Err = String>,
{
    let filter = status.map(parse_status::<E::Status>).transpose()?;
    println!("{}", list_request::<E>(filter));
    Ok(0)
}
