//! # Console Configuration
//!
//! Layered, lowest precedence first:
//!
//! 1. built-in defaults (`innovation-center`, `.opsdesk`, `token`);
//! 2. the YAML file given with `--config`;
//! 3. `OPSDESK_DEPLOYMENT` and `OPSDESK_STATE_DIR`;
//! 4. `--deployment` and `--state-dir` flags.
//!
//! ```yaml
//! deployment: clinic
//! state_dir: /var/lib/opsdesk
//! token_key: token
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use opsdesk_auth::DEFAULT_TOKEN_KEY;
use opsdesk_core::Deployment;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the deployment.
pub const ENV_DEPLOYMENT: &str = "OPSDESK_DEPLOYMENT";

/// Environment variable overriding the state directory.
pub const ENV_STATE_DIR: &str = "OPSDESK_STATE_DIR";

/// Resolved console settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Facility variant.
    pub deployment: Deployment,
    /// Directory holding the persisted token.
    pub state_dir: PathBuf,
    /// File name of the persisted token inside `state_dir`.
    pub token_key: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            deployment: Deployment::default(),
            state_dir: PathBuf::from(".opsdesk"),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--deployment`.
    pub deployment: Option<Deployment>,
    /// `--state-dir`.
    pub state_dir: Option<PathBuf>,
}

impl ConsoleConfig {
    /// Read a YAML config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Apply environment overrides read through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup(ENV_DEPLOYMENT).filter(|v| !v.trim().is_empty()) {
            self.deployment = raw
                .parse()
                .with_context(|| format!("invalid {ENV_DEPLOYMENT}"))?;
        }
        if let Some(raw) = lookup(ENV_STATE_DIR).filter(|v| !v.trim().is_empty()) {
            self.state_dir = PathBuf::from(raw);
        }
        Ok(self)
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(deployment) = overrides.deployment {
            self.deployment = deployment;
        }
        if let Some(dir) = &overrides.state_dir {
            self.state_dir = dir.clone();
        }
        self
    }

    /// Build the effective configuration from every layer.
    pub fn resolve(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let base = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = base
            .with_env(|key| std::env::var(key).ok())?
            .with_overrides(overrides);
        tracing::debug!(
            deployment = %config.deployment,
            state_dir = %config.state_dir.display(),
            "resolved console configuration"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults() {
        let config = ConsoleConfig::default();
        assert_eq!(config.deployment, Deployment::InnovationCenter);
        assert_eq!(config.state_dir, PathBuf::from(".opsdesk"));
        assert_eq!(config.token_key, "token");
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opsdesk.yaml");
        std::fs::write(&path, "deployment: clinic\n").unwrap();

        let config = ConsoleConfig::from_file(&path).unwrap();
        assert_eq!(config.deployment, Deployment::Clinic);
        assert_eq!(config.token_key, "token");
    }

    #[test]
    fn unknown_yaml_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opsdesk.yaml");
        std::fs::write(&path, "deploymnet: clinic\n").unwrap();
        assert!(ConsoleConfig::from_file(&path).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ConsoleConfig::from_file(Path::new("/nonexistent/opsdesk.yaml")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/opsdesk.yaml"));
    }

    #[test]
    fn env_then_flags() {
        let env = |key: &str| match key {
            ENV_DEPLOYMENT => Some("clinic".to_string()),
            ENV_STATE_DIR => Some("/tmp/env-state".to_string()),
            _ => None,
        };
        let config = ConsoleConfig::default().with_env(env).unwrap();
        assert_eq!(config.deployment, Deployment::Clinic);
        assert_eq!(config.state_dir, PathBuf::from("/tmp/env-state"));

        let config = config.with_overrides(&Overrides {
            deployment: Some(Deployment::InnovationCenter),
            state_dir: None,
        });
        assert_eq!(config.deployment, Deployment::InnovationCenter);
        assert_eq!(config.state_dir, PathBuf::from("/tmp/env-state"));
    }

    #[test]
    fn invalid_env_deployment_fails() {
        let env = |key: &str| (key == ENV_DEPLOYMENT).then(|| "hospital".to_string());
        assert!(ConsoleConfig::default().with_env(env).is_err());
        assert!(ConsoleConfig::default().with_env(no_env).is_ok());
    }
}
