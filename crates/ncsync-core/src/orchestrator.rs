// ── Reconciliation orchestrator ──
//
// Drives each device through probe → enable → backup. Every failure is
// captured in that device's report; nothing escapes to abort the run.

use std::time::Instant;

use chrono::Utc;
use tracing::{Level, debug, error, info, span, warn};

use crate::applier::{self, CommandBatch};
use crate::backup::BackupStore;
use crate::config::{Mode, ReconcileConfig};
use crate::error::CoreError;
use crate::model::{
    BackupRecord, ConfigDocument, Device, DeviceReport, Failure, Outcome, Phase, RunSummary,
};
use crate::session::{Connector, InteractiveSession, RpcSession, Scoped};
use crate::state::{PROBE_COMMAND, VERIFY_COMMAND, is_enabled};

/// Receives progress callbacks during a run.
pub trait ReconcileObserver {
    fn on_phase(&mut self, _address: &str, _phase: Phase) {}

    fn on_report(&mut self, _report: &DeviceReport) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ReconcileObserver for NoopObserver {}

/// Reconciles devices one at a time.
pub struct Reconciler<C: Connector> {
    connector: C,
    config: ReconcileConfig,
    plan: Plan,
    store: BackupStore,
}

/// What each device goes through, fixed by the run mode.
enum Plan {
    Reconcile(CommandBatch),
    BackupOnly,
    StatusOnly,
}

impl<C: Connector> Reconciler<C> {
    /// In reconcile mode, fails when the service account cannot be written
    /// into the enable batch.
    pub fn new(connector: C, config: ReconcileConfig) -> Result<Self, CoreError> {
        let plan = match config.mode {
            Mode::Reconcile => {
                Plan::Reconcile(CommandBatch::enable_netconf(&config.service_account)?)
            }
            Mode::BackupOnly => Plan::BackupOnly,
            Mode::StatusOnly => Plan::StatusOnly,
        };
        let store = BackupStore::new(&config.backup_root);
        Ok(Self {
            connector,
            config,
            plan,
            store,
        })
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Reconcile every device in order. One device's failure never stops
    /// the others.
    pub fn reconcile_all(
        &self,
        devices: &[Device],
        observer: &mut dyn ReconcileObserver,
    ) -> RunSummary {
        let mut summary = RunSummary::default();
        for device in devices {
            summary.reports.push(self.reconcile(device, &mut *observer));
        }
        info!(
            devices = devices.len(),
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            mode = %self.config.mode,
            "run complete"
        );
        summary
    }

    /// Reconcile one device and report what happened.
    pub fn reconcile(
        &self,
        device: &Device,
        observer: &mut dyn ReconcileObserver,
    ) -> DeviceReport {
        let span = span!(Level::INFO, "device", address = device.address());
        let _enter = span.enter();

        let started_at = Utc::now();
        let started = Instant::now();
        let mut attempt = Attempt {
            address: device.address(),
            phase: Phase::Init,
            observer,
            netconf_enabled: None,
            applied: false,
            verified: None,
        };
        attempt.enter(Phase::Init);

        let result = match &self.plan {
            Plan::Reconcile(batch) => self.run_full(batch, device, &mut attempt),
            Plan::BackupOnly => self.backup(device, &mut attempt).map(Some),
            Plan::StatusOnly => self.status(device, &mut attempt).map(|()| None),
        };

        let (backup, outcome) = match result {
            Ok(backup) => {
                attempt.enter(Phase::Done);
                (backup, Outcome::Done)
            }
            Err(e) => {
                let failure = Failure::new(attempt.phase, &e);
                error!(phase = %failure.phase, kind = %failure.kind, error = %e, "device failed");
                (None, Outcome::Failed(failure))
            }
        };

        let report = DeviceReport {
            address: device.address().to_owned(),
            started_at,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            netconf_enabled: attempt.netconf_enabled,
            applied: attempt.applied,
            verified: attempt.verified,
            backup,
            outcome,
        };
        attempt.observer.on_report(&report);
        report
    }

    fn run_full(
        &self,
        batch: &CommandBatch,
        device: &Device,
        attempt: &mut Attempt<'_, '_>,
    ) -> Result<Option<BackupRecord>, CoreError> {
        self.ensure_enabled(batch, device, attempt)?;
        self.backup(device, attempt).map(Some)
    }

    /// Probe and, when NETCONF is off, apply the enable batch. The CLI
    /// session is closed before returning on every path.
    fn ensure_enabled(
        &self,
        batch: &CommandBatch,
        device: &Device,
        attempt: &mut Attempt<'_, '_>,
    ) -> Result<(), CoreError> {
        attempt.enter(Phase::ConnectingSsh);
        let mut cli = Scoped::new(self.connector.open_interactive(device)?, device.address());

        attempt.enter(Phase::Probing);
        let probe = cli.probe(PROBE_COMMAND)?;
        let enabled = probe.is_enabled();
        attempt.netconf_enabled = Some(enabled);

        if enabled {
            attempt.enter(Phase::Skipping);
            info!("NETCONF already enabled, leaving configuration untouched");
        } else {
            attempt.enter(Phase::Applying);
            info!(lines = batch.len(), "NETCONF disabled, applying enable batch");
            let applied = applier::apply(&mut *cli, batch);
            debug!(output = %applied.output, "batch output");
            attempt.applied = true;

            if self.config.verify_after_apply {
                attempt.verified = Some(verify(&mut *cli));
            }
        }

        attempt.enter(Phase::DisconnectingSsh);
        cli.close();
        Ok(())
    }

    fn status(&self, device: &Device, attempt: &mut Attempt<'_, '_>) -> Result<(), CoreError> {
        attempt.enter(Phase::ConnectingSsh);
        let mut cli = Scoped::new(self.connector.open_interactive(device)?, device.address());

        attempt.enter(Phase::Probing);
        let probe = cli.probe(PROBE_COMMAND)?;
        attempt.netconf_enabled = Some(probe.is_enabled());
        info!(enabled = probe.is_enabled(), "NETCONF state probed");

        attempt.enter(Phase::DisconnectingSsh);
        cli.close();
        Ok(())
    }

    /// Retrieve the running configuration, extract the identity, and
    /// write the backup.
    fn backup(
        &self,
        device: &Device,
        attempt: &mut Attempt<'_, '_>,
    ) -> Result<BackupRecord, CoreError> {
        attempt.enter(Phase::ConnectingRpc);
        let mut rpc = Scoped::new(self.connector.open_rpc(device)?, device.address());

        attempt.enter(Phase::Retrieving);
        let raw = rpc.get_running_config(self.config.rpc_filter.as_deref())?;
        rpc.close();

        attempt.enter(Phase::Parsing);
        let document = ConfigDocument::new(raw);
        let identity = document.device_identity()?;
        info!(identity = %identity, bytes = document.raw().len(), "configuration retrieved");

        attempt.enter(Phase::Persisting);
        let storage_path = self.store.persist(&identity, document.raw())?;
        info!(path = %storage_path.display(), "backup saved");

        Ok(BackupRecord {
            device_identity: identity,
            storage_path,
            bytes: document.raw().len(),
        })
    }
}

/// Run the status listing after applying; a failure here is only logged.
fn verify<S: InteractiveSession + ?Sized>(cli: &mut S) -> bool {
    match cli.send_command(VERIFY_COMMAND) {
        Ok(output) if is_enabled(&output) => {
            info!("NETCONF confirmed enabled");
            true
        }
        Ok(_) => {
            warn!("NETCONF still not reported as enabled after applying batch");
            false
        }
        Err(e) => {
            warn!(error = %e, "post-apply verification failed");
            false
        }
    }
}

/// Per-device progress: current phase plus facts learned along the way.
struct Attempt<'a, 'o> {
    address: &'a str,
    phase: Phase,
    observer: &'o mut dyn ReconcileObserver,
    netconf_enabled: Option<bool>,
    applied: bool,
    verified: Option<bool>,
}

impl Attempt<'_, '_> {
    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        debug!(%phase, "phase");
        self.observer.on_phase(self.address, phase);
    }
}
