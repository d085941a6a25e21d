//! # opsdesk-cli — Console Core on the Command Line
//!
//! Drives the session store, access guard, and workflow engine against a
//! local state directory, so every decision the console UI makes can be
//! reproduced from a shell.
//!
//! ## Subcommands
//!
//! - `opsdesk session` — login, logout, whoami.
//! - `opsdesk access` — route checks and the navigation menu.
//! - `opsdesk workflow` — transitions, withdrawals, and actions on entity files.
//! - `opsdesk decode` — inspect a credential without logging in.
//!
//! ## Exit Codes
//!
//! `0` success, `1` error, `2` denied (no session, missing role, or an
//! illegal transition).

pub mod access;
pub mod config;
pub mod decode;
pub mod session;
pub mod workflow;

use anyhow::{Context, Result};
use opsdesk_auth::{FileTokenStore, SessionStore};

use crate::config::ConsoleConfig;

/// Exit code for an expected refusal.
pub const EXIT_DENIED: u8 = 2;

/// Open the file-backed session described by `config`.
pub fn open_session(config: &ConsoleConfig) -> Result<SessionStore<FileTokenStore>> {
    let store = FileTokenStore::new(&config.state_dir, &config.token_key)
        .context("invalid token_key in configuration")?;
    Ok(SessionStore::init(store, config.deployment))
}

#[cfg(test)]
pub(crate) mod testutil {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    use crate::config::ConsoleConfig;

    /// An unsigned credential carrying `payload`.
    pub fn token(payload: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        format!("{header}.{}.sig", URL_SAFE_NO_PAD.encode(payload.to_string()))
    }

    /// Config rooted in `dir`.
    pub fn config(dir: &std::path::Path, deployment: opsdesk_core::Deployment) -> ConsoleConfig {
        ConsoleConfig {
            deployment,
            state_dir: dir.to_path_buf(),
            ..ConsoleConfig::default()
        }
    }
}
