//! `run`, `backup` and `status` handlers.

use std::io::IsTerminal;

use secrecy::SecretString;
use tracing::{debug, info};

use ncsync_core::{
    Credentials, Device, FileInventory, Inventory, Mode, NoopObserver, ReconcileObserver,
    Reconciler, StaticInventory,
};

use crate::cli::{GlobalOpts, TargetArgs};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::progress::Spinner;
use crate::{logging, output};

pub fn handle(mode: Mode, args: &TargetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load(global)?;
    config::apply_target_overrides(&mut cfg, args);

    let _log_guard = logging::init(global.verbose, Some(&cfg.log_dir))?;
    info!(%mode, config = %config::active_path(global).display(), "ncsync starting");

    let addresses = targets(args)?;
    let connector = cfg.connector()?;

    let rpc_password = rpc_password(&cfg, mode)?;
    let ssh_password = if mode == Mode::BackupOnly {
        SecretString::from(String::new())
    } else {
        config::ssh_password(&cfg)?
    };

    let devices = addresses
        .iter()
        .map(|address| {
            Device::new(
                address.as_str(),
                Credentials::new(cfg.ssh_username.clone(), ssh_password.clone()),
                Credentials::new(cfg.rpc_username.clone(), rpc_password.clone()),
                cfg.rpc_port,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let reconciler = Reconciler::new(connector, cfg.reconcile_config(rpc_password, mode)?)?;
    debug!(devices = devices.len(), "targets resolved");

    let summary = {
        let mut observer: Box<dyn ReconcileObserver> =
            if global.quiet || !std::io::stderr().is_terminal() {
                Box::new(NoopObserver)
            } else {
                Box::new(Spinner::new(devices.len()))
            };
        reconciler.reconcile_all(&devices, observer.as_mut())
    };

    let color = output::should_color(global.color);
    let rendered = output::render_summary(global.output, &summary, color)?;
    output::print_output(&rendered, global.quiet);
    if !global.quiet && global.output == crate::cli::OutputFormat::Table {
        eprintln!("{}", output::tally(&summary, color));
    }

    if summary.all_succeeded() {
        Ok(())
    } else {
        Err(CliError::DevicesFailed {
            failed: summary.failed(),
            total: summary.reports.len(),
            log: logging::log_file(&cfg.log_dir).display().to_string(),
        })
    }
}

/// `--node` addresses first, then the inventory file; duplicates dropped.
fn targets(args: &TargetArgs) -> Result<Vec<String>, CliError> {
    let mut addresses = args.nodes.clone();
    if let Some(ref path) = args.inventory {
        addresses.extend(FileInventory::new(path).addresses()?);
    }
    let addresses = StaticInventory::new(addresses).addresses()?;
    if addresses.is_empty() {
        return Err(CliError::NoTargets);
    }
    Ok(addresses)
}

/// The status probe never uses NETCONF, so a missing password is only an
/// error for the other modes.
fn rpc_password(cfg: &Config, mode: Mode) -> Result<SecretString, CliError> {
    match config::rpc_password(cfg) {
        Ok(pw) => Ok(pw),
        Err(_) if mode == Mode::StatusOnly => Ok(SecretString::from(String::new())),
        Err(e) => Err(e),
    }
}
