//! Reconciliation engine between `ncsync-transport` and the CLI.
//!
//! For each device the engine:
//!
//! - opens an interactive SSH session and runs the NETCONF state probe
//!   ([`state::PROBE_COMMAND`]);
//! - when the service is off, sends the thirteen-line enable batch
//!   ([`CommandBatch`]) and closes the session;
//! - opens a NETCONF session, fetches the running configuration, reads the
//!   device identity from `rpc-reply/data/configure/system/name`
//!   ([`extractor`]);
//! - writes the reply verbatim to `<root>/<identity>/<identity>.txt`
//!   ([`BackupStore`]).
//!
//! [`Reconciler`] drives the sequence and records one [`DeviceReport`] per
//! device. Sessions are reached through the [`Connector`] trait so tests can
//! substitute scripted devices for [`SshConnector`].

pub mod applier;
pub mod backup;
pub mod config;
pub mod connector;
pub mod error;
pub mod extractor;
pub mod inventory;
pub mod model;
pub mod orchestrator;
pub mod session;
pub mod state;

// ── Primary re-exports ──────────────────────────────────────────────
pub use applier::{ApplyOutput, CommandBatch, ConfigLine};
pub use backup::BackupStore;
pub use config::{Mode, ReconcileConfig};
pub use connector::SshConnector;
pub use error::{CoreError, ErrorKind};
pub use inventory::{FileInventory, Inventory, StaticInventory};
pub use model::{
    BackupRecord, ConfigDocument, Credentials, DEFAULT_RPC_PORT, Device, DeviceReport, Failure,
    Outcome, Phase, ProbeResult, Protocol, RunSummary,
};
pub use orchestrator::{NoopObserver, ReconcileObserver, Reconciler};
pub use session::{Connector, InteractiveSession, RpcSession, Scoped, Session};

// Transport types callers need to build an `SshConnector`.
pub use ncsync_transport::{DeviceProfile, HostKeyPolicy, TransportConfig};
