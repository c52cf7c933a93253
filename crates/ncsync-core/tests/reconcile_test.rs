#![allow(clippy::unwrap_used)]
// Reconciliation scenarios against scripted in-memory devices.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use secrecy::SecretString;

use ncsync_core::state::{PROBE_COMMAND, VERIFY_COMMAND};
use ncsync_core::{
    Connector, CoreError, Credentials, Device, ErrorKind, InteractiveSession, Mode, NoopObserver,
    Outcome, Phase, Protocol, ReconcileConfig, ReconcileObserver, Reconciler, RpcSession, Session,
};

// ── Scripted devices ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    CliOpen(String),
    Command(String, String),
    CliClose(String),
    RpcOpen(String),
    GetConfig(String, Option<String>),
    RpcClose(String),
}

#[derive(Clone)]
struct Behaviour {
    enabled: bool,
    cli_connect_fails: bool,
    rpc_connect_fails: bool,
    probe_fails: bool,
    reject_containing: Option<&'static str>,
    reply: String,
}

impl Behaviour {
    fn named(name: &str, enabled: bool) -> Self {
        Self {
            enabled,
            cli_connect_fails: false,
            rpc_connect_fails: false,
            probe_fails: false,
            reject_containing: None,
            reply: reply_for(name),
        }
    }
}

fn reply_for(name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rpc-reply xmlns="urn:ietf:params:xml:ns:netconf:base:1.0" message-id="1">
  <data>
    <configure xmlns="urn:nokia.com:sros:ns:yang:sr:conf">
      <system>
        <name>{name}</name>
      </system>
    </configure>
  </data>
</rpc-reply>"#
    )
}

type Log = Rc<RefCell<Vec<Event>>>;

struct Fleet {
    devices: HashMap<String, Behaviour>,
    log: Log,
}

impl Fleet {
    fn new(devices: impl IntoIterator<Item = (&'static str, Behaviour)>) -> (Self, Log) {
        let log = Log::default();
        let fleet = Self {
            devices: devices
                .into_iter()
                .map(|(addr, b)| (addr.to_owned(), b))
                .collect(),
            log: Rc::clone(&log),
        };
        (fleet, log)
    }

    fn behaviour(&self, device: &Device) -> Behaviour {
        self.devices[device.address()].clone()
    }
}

struct FakeCli {
    address: String,
    behaviour: Behaviour,
    log: Log,
}

impl Session for FakeCli {
    fn protocol(&self) -> Protocol {
        Protocol::Ssh
    }

    fn close(&mut self) -> Result<(), CoreError> {
        self.log
            .borrow_mut()
            .push(Event::CliClose(self.address.clone()));
        Ok(())
    }
}

impl InteractiveSession for FakeCli {
    fn send_command(&mut self, command: &str) -> Result<String, CoreError> {
        self.log
            .borrow_mut()
            .push(Event::Command(self.address.clone(), command.to_owned()));

        if command == PROBE_COMMAND || command == VERIFY_COMMAND {
            if self.behaviour.probe_fails {
                return Err(CoreError::Command {
                    reason: "Timed out after 30s waiting for command output".into(),
                });
            }
            let state = if self.behaviour.enabled {
                "Enabled"
            } else {
                "Disabled"
            };
            return Ok(format!("    Administrative State      : {state}"));
        }

        if let Some(needle) = self.behaviour.reject_containing {
            if command.contains(needle) {
                return Err(CoreError::Command {
                    reason: "MINOR: CLI Command not allowed".into(),
                });
            }
        }
        if command.contains("netconf no shutdown") {
            self.behaviour.enabled = true;
        }
        Ok(String::new())
    }
}

struct FakeRpc {
    address: String,
    reply: String,
    log: Log,
}

impl Session for FakeRpc {
    fn protocol(&self) -> Protocol {
        Protocol::Netconf
    }

    fn close(&mut self) -> Result<(), CoreError> {
        self.log
            .borrow_mut()
            .push(Event::RpcClose(self.address.clone()));
        Ok(())
    }
}

impl RpcSession for FakeRpc {
    fn get_running_config(&mut self, filter: Option<&str>) -> Result<String, CoreError> {
        self.log.borrow_mut().push(Event::GetConfig(
            self.address.clone(),
            filter.map(str::to_owned),
        ));
        Ok(self.reply.clone())
    }
}

impl Connector for Fleet {
    type Interactive = FakeCli;
    type Rpc = FakeRpc;

    fn open_interactive(&self, device: &Device) -> Result<FakeCli, CoreError> {
        let behaviour = self.behaviour(device);
        if behaviour.cli_connect_fails {
            return Err(CoreError::Connect {
                protocol: Protocol::Ssh,
                address: device.address().to_owned(),
                reason: "connection refused".into(),
            });
        }
        self.log
            .borrow_mut()
            .push(Event::CliOpen(device.address().to_owned()));
        Ok(FakeCli {
            address: device.address().to_owned(),
            behaviour,
            log: Rc::clone(&self.log),
        })
    }

    fn open_rpc(&self, device: &Device) -> Result<FakeRpc, CoreError> {
        let behaviour = self.behaviour(device);
        if behaviour.rpc_connect_fails {
            return Err(CoreError::Connect {
                protocol: Protocol::Netconf,
                address: device.address().to_owned(),
                reason: "authentication failed".into(),
            });
        }
        self.log
            .borrow_mut()
            .push(Event::RpcOpen(device.address().to_owned()));
        Ok(FakeRpc {
            address: device.address().to_owned(),
            reply: behaviour.reply,
            log: Rc::clone(&self.log),
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn device(address: &str) -> Device {
    Device::new(
        address,
        Credentials::new("admin", SecretString::from("admin-pw")),
        Credentials::new("netconf", SecretString::from("nc-pw")),
        830,
    )
    .unwrap()
}

fn config(root: &Path) -> ReconcileConfig {
    ReconcileConfig::new(
        Credentials::new("netconf", SecretString::from("nc-pw")),
        root,
    )
}

fn commands(log: &Log, address: &str) -> Vec<String> {
    log.borrow()
        .iter()
        .filter_map(|e| match e {
            Event::Command(a, c) if a == address => Some(c.clone()),
            _ => None,
        })
        .collect()
}

fn count(log: &Log, wanted: impl Fn(&Event) -> bool) -> usize {
    log.borrow().iter().filter(|e| wanted(e)).count()
}

#[derive(Default)]
struct PhaseLog(Vec<(String, Phase)>);

impl ReconcileObserver for PhaseLog {
    fn on_phase(&mut self, address: &str, phase: Phase) {
        self.0.push((address.to_owned(), phase));
    }
}

// ── Scenarios ───────────────────────────────────────────────────────

#[test]
fn already_enabled_device_is_only_backed_up() {
    let tmp = tempfile::tempdir().unwrap();
    let (fleet, log) = Fleet::new([("10.0.0.1", Behaviour::named("R-EDGE-01", true))]);
    let reconciler = Reconciler::new(fleet, config(tmp.path())).unwrap();

    let report = reconciler.reconcile(&device("10.0.0.1"), &mut NoopObserver);

    assert_eq!(report.outcome, Outcome::Done);
    assert_eq!(report.netconf_enabled, Some(true));
    assert!(!report.applied);
    assert_eq!(commands(&log, "10.0.0.1"), vec![PROBE_COMMAND.to_owned()]);

    let path = tmp.path().join("R-EDGE-01").join("R-EDGE-01.txt");
    assert_eq!(fs::read_to_string(&path).unwrap(), reply_for("R-EDGE-01"));
    assert_eq!(report.backup.unwrap().storage_path, path);
}

#[test]
fn disabled_device_receives_batch_then_backup() {
    let tmp = tempfile::tempdir().unwrap();
    let (fleet, log) = Fleet::new([("10.0.0.2", Behaviour::named("PE2", false))]);
    let reconciler = Reconciler::new(fleet, config(tmp.path())).unwrap();

    let report = reconciler.reconcile(&device("10.0.0.2"), &mut NoopObserver);

    assert!(report.succeeded());
    assert!(report.applied);
    assert_eq!(report.verified, Some(true));

    let sent = commands(&log, "10.0.0.2");
    assert_eq!(sent.len(), 1 + 13 + 1);
    assert_eq!(sent[0], PROBE_COMMAND);
    assert!(sent[1].ends_with("base-op-authorization lock"));
    assert!(sent[13].ends_with("configuration-mode model-driven"));
    assert_eq!(sent[14], VERIFY_COMMAND);

    // CLI is closed before NETCONF is opened.
    let events = log.borrow();
    let cli_close = events.iter().position(|e| matches!(e, Event::CliClose(_))).unwrap();
    let rpc_open = events.iter().position(|e| matches!(e, Event::RpcOpen(_))).unwrap();
    assert!(cli_close < rpc_open);

    assert!(tmp.path().join("PE2").join("PE2.txt").exists());
}

#[test]
fn rejected_batch_line_does_not_stop_the_batch() {
    let tmp = tempfile::tempdir().unwrap();
    let mut behaviour = Behaviour::named("PE3", false);
    behaviour.reject_containing = Some("no base-r13-modules");
    let (fleet, log) = Fleet::new([("10.0.0.3", behaviour)]);
    let reconciler = Reconciler::new(fleet, config(tmp.path())).unwrap();

    let report = reconciler.reconcile(&device("10.0.0.3"), &mut NoopObserver);

    assert!(report.succeeded());
    assert_eq!(commands(&log, "10.0.0.3").len(), 15);
}

#[test]
fn unreachable_device_does_not_stop_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    let mut unreachable = Behaviour::named("X", true);
    unreachable.cli_connect_fails = true;
    let (fleet, log) = Fleet::new([
        ("10.0.0.9", unreachable),
        ("10.0.0.1", Behaviour::named("R-EDGE-01", true)),
    ]);
    let reconciler = Reconciler::new(fleet, config(tmp.path())).unwrap();

    let summary = reconciler.reconcile_all(
        &[device("10.0.0.9"), device("10.0.0.1")],
        &mut NoopObserver,
    );

    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.failed(), 1);

    let failure = summary.reports[0].outcome.failure().unwrap();
    assert_eq!(failure.phase, Phase::ConnectingSsh);
    assert_eq!(failure.kind, ErrorKind::Connect);
    assert!(summary.reports[1].succeeded());

    assert_eq!(count(&log, |e| matches!(e, Event::RpcOpen(a) if a == "10.0.0.9")), 0);
    assert!(tmp.path().join("R-EDGE-01").join("R-EDGE-01.txt").exists());
}

#[test]
fn probe_failure_is_scoped_to_the_device() {
    let tmp = tempfile::tempdir().unwrap();
    let mut flaky = Behaviour::named("PE4", false);
    flaky.probe_fails = true;
    let (fleet, log) = Fleet::new([("10.0.0.4", flaky)]);
    let reconciler = Reconciler::new(fleet, config(tmp.path())).unwrap();

    let report = reconciler.reconcile(&device("10.0.0.4"), &mut NoopObserver);

    let failure = report.outcome.failure().unwrap();
    assert_eq!(failure.phase, Phase::Probing);
    assert_eq!(failure.kind, ErrorKind::Command);
    assert!(!report.applied);
    assert_eq!(count(&log, |e| matches!(e, Event::CliClose(_))), 1);
    assert_eq!(count(&log, |e| matches!(e, Event::RpcOpen(_))), 0);
}

#[test]
fn unparsable_reply_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let mut broken = Behaviour::named("unused", true);
    broken.reply = "<rpc-reply><data><configure/></data></rpc-reply>".into();
    let (fleet, log) = Fleet::new([("10.0.0.5", broken)]);
    let reconciler = Reconciler::new(fleet, config(tmp.path())).unwrap();

    let report = reconciler.reconcile(&device("10.0.0.5"), &mut NoopObserver);

    let failure = report.outcome.failure().unwrap();
    assert_eq!(failure.phase, Phase::Parsing);
    assert_eq!(failure.kind, ErrorKind::Parse);
    assert_eq!(count(&log, |e| matches!(e, Event::RpcClose(_))), 1);
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn netconf_auth_failure_after_enable() {
    let tmp = tempfile::tempdir().unwrap();
    let mut denied = Behaviour::named("PE6", false);
    denied.rpc_connect_fails = true;
    let (fleet, log) = Fleet::new([("10.0.0.6", denied)]);
    let reconciler = Reconciler::new(fleet, config(tmp.path())).unwrap();

    let report = reconciler.reconcile(&device("10.0.0.6"), &mut NoopObserver);

    let failure = report.outcome.failure().unwrap();
    assert_eq!(failure.phase, Phase::ConnectingRpc);
    assert_eq!(failure.kind, ErrorKind::Connect);
    assert!(report.applied);
    assert_eq!(count(&log, |e| matches!(e, Event::CliClose(_))), 1);
}

#[test]
fn storage_failure_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("backups");
    fs::write(&blocker, "occupied").unwrap();
    let (fleet, _log) = Fleet::new([("10.0.0.7", Behaviour::named("PE7", true))]);
    let reconciler = Reconciler::new(fleet, config(&blocker)).unwrap();

    let report = reconciler.reconcile(&device("10.0.0.7"), &mut NoopObserver);

    let failure = report.outcome.failure().unwrap();
    assert_eq!(failure.phase, Phase::Persisting);
    assert_eq!(failure.kind, ErrorKind::Storage);
}

#[test]
fn filter_is_forwarded_to_get_config() {
    let tmp = tempfile::tempdir().unwrap();
    let (fleet, log) = Fleet::new([("10.0.0.8", Behaviour::named("PE8", true))]);
    let mut config = config(tmp.path());
    config.rpc_filter = Some("<configure/>".into());
    config.mode = Mode::BackupOnly;
    let reconciler = Reconciler::new(fleet, config).unwrap();

    reconciler.reconcile(&device("10.0.0.8"), &mut NoopObserver);

    assert_eq!(
        log.borrow().as_slice(),
        &[
            Event::RpcOpen("10.0.0.8".into()),
            Event::GetConfig("10.0.0.8".into(), Some("<configure/>".into())),
            Event::RpcClose("10.0.0.8".into()),
        ]
    );
}

#[test]
fn observer_sees_phases_in_order() {
    let tmp = tempfile::tempdir().unwrap();
    let (fleet, _log) = Fleet::new([("10.0.0.1", Behaviour::named("R1", false))]);
    let mut config = config(tmp.path());
    config.verify_after_apply = false;
    let reconciler = Reconciler::new(fleet, config).unwrap();
    let mut phases = PhaseLog::default();

    reconciler.reconcile(&device("10.0.0.1"), &mut phases);

    let seen: Vec<Phase> = phases.0.into_iter().map(|(_, p)| p).collect();
    assert_eq!(
        seen,
        vec![
            Phase::Init,
            Phase::ConnectingSsh,
            Phase::Probing,
            Phase::Applying,
            Phase::DisconnectingSsh,
            Phase::ConnectingRpc,
            Phase::Retrieving,
            Phase::Parsing,
            Phase::Persisting,
            Phase::Done,
        ]
    );
}

#[test]
fn middle_device_rpc_failure_leaves_neighbours_done() {
    let tmp = tempfile::tempdir().unwrap();
    let mut refused = Behaviour::named("PE2", true);
    refused.rpc_connect_fails = true;
    let (fleet, _log) = Fleet::new([
        ("10.0.1.1", Behaviour::named("PE1", false)),
        ("10.0.1.2", refused),
        ("10.0.1.3", Behaviour::named("PE3", true)),
    ]);
    let reconciler = Reconciler::new(fleet, config(tmp.path())).unwrap();

    let summary = reconciler.reconcile_all(
        &[device("10.0.1.1"), device("10.0.1.2"), device("10.0.1.3")],
        &mut NoopObserver,
    );

    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.failed(), 1);
    assert!(summary.reports[0].succeeded());
    assert_eq!(
        summary.reports[1].outcome.failure().unwrap().kind,
        ErrorKind::Connect
    );
    assert!(summary.reports[2].succeeded());

    assert_eq!(
        fs::read_to_string(tmp.path().join("PE1").join("PE1.txt")).unwrap(),
        reply_for("PE1")
    );
    assert!(!tmp.path().join("PE2").exists());
    assert!(tmp.path().join("PE3").join("PE3.txt").exists());
}
