//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use ncsync_config::{ConfigError, SecretKind};
use ncsync_core::CoreError;

/// Process exit codes.
#[allow(dead_code)]
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const PARTIAL_FAILURE: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Run outcome ──────────────────────────────────────────────────
    #[error("{failed} of {total} device(s) failed")]
    #[diagnostic(
        code(ncsync::devices_failed),
        help(
            "Each failure lists its phase and reason above.\n\
             Full detail is in the log file: {log}"
        )
    )]
    DevicesFailed {
        failed: usize,
        total: usize,
        log: String,
    },

    #[error("No devices to process")]
    #[diagnostic(
        code(ncsync::no_targets),
        help("Pass --node <ADDRESS> (repeatable) or --inventory <FILE>.")
    )]
    NoTargets,

    // ── Credentials ──────────────────────────────────────────────────
    #[error("No {kind} password found for user '{username}'")]
    #[diagnostic(
        code(ncsync::no_credentials),
        help(
            "Set {env}, or store it with: ncsync config set-password {target}\n\
             A plaintext rpc_password in the config file also works (not recommended)."
        )
    )]
    NoCredentials {
        kind: SecretKind,
        username: String,
        env: &'static str,
        target: &'static str,
    },

    #[error("{what} is required but stdin is not a terminal")]
    #[diagnostic(
        code(ncsync::non_interactive),
        help("Provide it through the environment or the system keyring instead.")
    )]
    NonInteractive { what: String },

    #[error("Keyring error: {0}")]
    #[diagnostic(
        code(ncsync::keyring),
        help("Check that a secret service (or the platform keychain) is available.")
    )]
    Keyring(String),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ncsync::validation))]
    Validation { field: String, reason: String },

    #[error("Cannot read inventory {path}: {reason}")]
    #[diagnostic(
        code(ncsync::inventory),
        help("The inventory is a text file with one address per line.")
    )]
    Inventory { path: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(ncsync::config),
        help("Run: ncsync config path   to see which file is read.")
    )]
    Config(Box<ConfigError>),

    #[error("Cannot open log file in {dir}: {reason}")]
    #[diagnostic(
        code(ncsync::log_file),
        help("Set log_dir in the config file or NCSYNC_LOG_DIR to a writable directory.")
    )]
    LogFile { dir: String, reason: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Prompt failed: {0}")]
    #[diagnostic(code(ncsync::prompt))]
    Prompt(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(ncsync::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(ncsync::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DevicesFailed { .. } => exit_code::PARTIAL_FAILURE,
            Self::NoCredentials { .. } | Self::NonInteractive { .. } | Self::Keyring(_) => {
                exit_code::AUTH
            }
            Self::NoTargets | Self::Validation { .. } | Self::Inventory { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn prompt(e: impl std::fmt::Display) -> Self {
        Self::Prompt(e.to_string())
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { kind, username } => {
                let (env, target) = match kind {
                    SecretKind::Rpc => (ncsync_config::RPC_PASSWORD_ENV, "rpc"),
                    SecretKind::Ssh => (ncsync_config::SSH_PASSWORD_ENV, "ssh"),
                };
                Self::NoCredentials {
                    kind,
                    username,
                    env,
                    target,
                }
            }
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Keyring(reason) => Self::Keyring(reason),
            other => Self::Config(Box::new(other)),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────
//
// Per-device errors never get here; they are captured in reports. Only
// input errors raised before a run starts are converted.

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidDevice { field, reason } => Self::Validation {
                field: field.into(),
                reason,
            },
            CoreError::Inventory { path, reason } => Self::Inventory {
                path: path.display().to_string(),
                reason,
            },
            other => Self::Validation {
                field: "input".into(),
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_failures_use_partial_failure_code() {
        let err = CliError::DevicesFailed {
            failed: 1,
            total: 3,
            log: "logging/ncsync.log".into(),
        };
        assert_eq!(err.exit_code(), exit_code::PARTIAL_FAILURE);
        assert_eq!(err.to_string(), "1 of 3 device(s) failed");
    }

    #[test]
    fn missing_rpc_password_points_at_env_var() {
        let err = CliError::from(ConfigError::NoCredentials {
            kind: SecretKind::Rpc,
            username: "netconf".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
        assert!(matches!(
            err,
            CliError::NoCredentials {
                env: "NCSYNC_RPC_PASSWORD",
                ..
            }
        ));
    }
}
