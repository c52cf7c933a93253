// ── Reconciliation settings ──
//
// What a run should do once a session is open. Built by the CLI from its
// layered configuration; core never reads config files or the environment.

use std::path::PathBuf;

use serde::Serialize;

use crate::model::Credentials;

/// Which steps a run performs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Mode {
    /// Probe, enable if needed, then back up.
    #[default]
    Reconcile,
    /// NETCONF retrieval and backup only; no CLI session.
    BackupOnly,
    /// CLI probe only; nothing is changed or written.
    StatusOnly,
}

/// Settings shared by every device in a run.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Account provisioned on devices that need NETCONF enabled.
    pub service_account: Credentials,
    /// Directory receiving `<identity>/<identity>.txt` backups.
    pub backup_root: PathBuf,
    /// Subtree filter for `<get-config>`; `None` fetches the full datastore.
    pub rpc_filter: Option<String>,
    /// Run the status command after applying the enable batch.
    pub verify_after_apply: bool,
    pub mode: Mode,
}

impl ReconcileConfig {
    pub fn new(service_account: Credentials, backup_root: impl Into<PathBuf>) -> Self {
        Self {
            service_account,
            backup_root: backup_root.into(),
            rpc_filter: None,
            verify_after_apply: true,
            mode: Mode::default(),
        }
    }
}
