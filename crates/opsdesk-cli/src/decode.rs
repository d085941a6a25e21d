//! # Decode Subcommand
//!
//! Prints the claims of a credential and the identity it would resolve to,
//! without touching the session.

use anyhow::Result;
use clap::Args;
use opsdesk_auth::{decode, resolve};
use serde_json::json;

use crate::config::ConsoleConfig;
use crate::EXIT_DENIED;

/// Arguments for the `opsdesk decode` subcommand.
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// The bearer token to inspect.
    pub token: String,
}

/// Execute the decode subcommand.
pub fn run_decode(args: &DecodeArgs, config: &ConsoleConfig) -> Result<u8> {
    let claims = match decode(&args.token) {
        Ok(claims) => claims,
        Err(e) => {
            println!("INVALID: {e}");
            return Ok(EXIT_DENIED);
        }
    };

    let identity = match resolve(&claims, config.deployment) {
        Ok(identity) => serde_json::to_value(&identity)?,
        Err(e) => json!({ "error": e.to_string() }),
    };
    let expired = claims.is_expired_at(opsdesk_core::Timestamp::now());
    let report = json!({
        "claims": claims,
        "expired": expired,
        "deployment": config.deployment,
        "identity": identity,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(0)
}
