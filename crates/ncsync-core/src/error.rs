// ── Core error types ──
//
// Every failure the reconciliation engine can produce. Transport errors
// are translated at the session boundary (see `connector`) so that the
// orchestrator only ever reasons about the `ErrorKind` taxonomy.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::model::Protocol;

/// Coarse classification used in per-device outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ErrorKind {
    /// Transport or authentication failure on either protocol.
    Connect,
    /// The device rejected or timed out an operation.
    Command,
    /// The retrieved configuration could not be interpreted.
    Parse,
    /// The backup could not be written.
    Storage,
    /// Invalid input; never produced while a device is being reconciled.
    Config,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("{protocol} connection to {address} failed: {reason}")]
    Connect {
        protocol: Protocol,
        address: String,
        reason: String,
    },

    // ── Device operation errors ──────────────────────────────────────
    #[error("command failed: {reason}")]
    Command { reason: String },

    #[error("NETCONF retrieval failed: {reason}")]
    Retrieve { reason: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("configuration parse error: {reason}")]
    Parse { reason: String },

    // ── Storage errors ───────────────────────────────────────────────
    #[error("cannot write backup at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("device identity '{identity}' is not usable as a backup directory name")]
    InvalidIdentity { identity: String },

    // ── Input errors ─────────────────────────────────────────────────
    #[error("invalid {field}: {reason}")]
    InvalidDevice { field: &'static str, reason: String },

    #[error("cannot read inventory {}: {reason}", path.display())]
    Inventory { path: PathBuf, reason: String },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connect { .. } => ErrorKind::Connect,
            Self::Command { .. } | Self::Retrieve { .. } => ErrorKind::Command,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Storage { .. } | Self::InvalidIdentity { .. } => ErrorKind::Storage,
            Self::InvalidDevice { .. } | Self::Inventory { .. } => ErrorKind::Config,
        }
    }

    pub(crate) fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }
}
