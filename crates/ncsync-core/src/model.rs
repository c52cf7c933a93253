// ── Domain model ──
//
// Plain data flowing through a reconciliation: the device descriptor,
// probe result, retrieved configuration, backup record, and the
// per-device report handed back to callers.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;

use crate::error::{CoreError, ErrorKind};
use crate::{extractor, state};

/// Default NETCONF-over-SSH port.
pub const DEFAULT_RPC_PORT: u16 = 830;

/// Which of the two management protocols an operation used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum Protocol {
    #[strum(serialize = "SSH")]
    Ssh,
    #[strum(serialize = "NETCONF")]
    Netconf,
}

/// A username with its password.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// One managed device. Immutable once built.
#[derive(Debug, Clone)]
pub struct Device {
    address: String,
    ssh: Credentials,
    rpc: Credentials,
    rpc_port: u16,
}

impl Device {
    /// Validate and build a device descriptor.
    ///
    /// The address and both usernames must be non-empty and the NETCONF
    /// port must be non-zero.
    pub fn new(
        address: impl Into<String>,
        ssh: Credentials,
        rpc: Credentials,
        rpc_port: u16,
    ) -> Result<Self, CoreError> {
        let address = address.into().trim().to_owned();
        if address.is_empty() {
            return Err(invalid("address", "must not be empty"));
        }
        if address.chars().any(char::is_whitespace) {
            return Err(invalid("address", "must not contain whitespace"));
        }
        if ssh.username.trim().is_empty() {
            return Err(invalid("SSH username", "must not be empty"));
        }
        if rpc.username.trim().is_empty() {
            return Err(invalid("NETCONF username", "must not be empty"));
        }
        if rpc_port == 0 {
            return Err(invalid("NETCONF port", "must be between 1 and 65535"));
        }

        Ok(Self {
            address,
            ssh,
            rpc,
            rpc_port,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn ssh(&self) -> &Credentials {
        &self.ssh
    }

    pub fn rpc(&self) -> &Credentials {
        &self.rpc
    }

    pub fn rpc_port(&self) -> u16 {
        self.rpc_port
    }
}

fn invalid(field: &'static str, reason: &str) -> CoreError {
    CoreError::InvalidDevice {
        field,
        reason: reason.to_owned(),
    }
}

/// Output of the NETCONF state probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub raw_text: String,
}

impl ProbeResult {
    pub fn is_enabled(&self) -> bool {
        state::is_enabled(&self.raw_text)
    }
}

/// The running configuration exactly as the device returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    raw: String,
}

impl ConfigDocument {
    pub fn new(raw: String) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The device's configured system name.
    pub fn device_identity(&self) -> Result<String, CoreError> {
        extractor::extract(&self.raw)
    }
}

/// A configuration snapshot written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct BackupRecord {
    pub device_identity: String,
    pub storage_path: PathBuf,
    pub bytes: usize,
}

/// Where in the reconciliation a device currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Phase {
    Init,
    ConnectingSsh,
    Probing,
    Skipping,
    Applying,
    DisconnectingSsh,
    ConnectingRpc,
    Retrieving,
    Parsing,
    Persisting,
    Done,
}

/// Why a device did not reach [`Phase::Done`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub phase: Phase,
    pub kind: ErrorKind,
    pub detail: String,
}

impl Failure {
    pub fn new(phase: Phase, error: &CoreError) -> Self {
        Self {
            phase,
            kind: error.kind(),
            detail: error.to_string(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error during {}: {}", self.kind, self.phase, self.detail)
    }
}

/// Terminal result for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Done,
    Failed(Failure),
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Done => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

/// Everything observed while reconciling one device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    pub address: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Probe verdict; `None` when the probe never ran.
    pub netconf_enabled: Option<bool>,
    /// Whether the enable batch was sent.
    pub applied: bool,
    /// Result of the post-apply check; `None` when it did not run.
    pub verified: Option<bool>,
    pub backup: Option<BackupRecord>,
    pub outcome: Outcome,
}

impl DeviceReport {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_done()
    }
}

/// Reports for a whole run, in inventory order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub reports: Vec<DeviceReport>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn creds(user: &str) -> Credentials {
        Credentials::new(user, SecretString::from("pw"))
    }

    #[test]
    fn device_trims_address() {
        let device = Device::new(" 10.0.0.1 ", creds("admin"), creds("netconf"), 830).unwrap();
        assert_eq!(device.address(), "10.0.0.1");
        assert_eq!(device.rpc_port(), 830);
    }

    #[test]
    fn device_rejects_bad_input() {
        assert!(Device::new("", creds("admin"), creds("netconf"), 830).is_err());
        assert!(Device::new("10.0.0.1", creds(""), creds("netconf"), 830).is_err());
        assert!(Device::new("10.0.0.1", creds("admin"), creds(" "), 830).is_err());
        let err = Device::new("10.0.0.1", creds("admin"), creds("netconf"), 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn debug_output_redacts_passwords() {
        let device = Device::new("r1", creds("admin"), creds("netconf"), 830).unwrap();
        let rendered = format!("{device:?}");
        assert!(!rendered.contains("\"pw\""));
    }

    #[test]
    fn phase_renders_kebab_case() {
        assert_eq!(Phase::ConnectingRpc.to_string(), "connecting-rpc");
        assert_eq!(Phase::DisconnectingSsh.to_string(), "disconnecting-ssh");
    }

    #[test]
    fn failure_display_names_phase_and_kind() {
        let failure = Failure::new(Phase::Parsing, &CoreError::parse("no name"));
        assert_eq!(
            failure.to_string(),
            "parse error during parsing: configuration parse error: no name"
        );
    }
}
