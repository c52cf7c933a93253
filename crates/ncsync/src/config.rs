//! CLI-side configuration: file + env loading via `ncsync-config`, flag
//! overrides, and interactive credential fallback.

use std::io::IsTerminal;
use std::path::PathBuf;

use secrecy::SecretString;

pub use ncsync_config::{Config, config_path};

use crate::cli::{GlobalOpts, TargetArgs};
use crate::error::CliError;

/// The config file this invocation reads.
pub fn active_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load file + environment, then apply global flag overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = ncsync_config::load_config_from(&active_path(global))?;
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }
    Ok(cfg)
}

/// Apply per-command target flags on top of the loaded config.
pub fn apply_target_overrides(cfg: &mut Config, args: &TargetArgs) {
    if let Some(ref user) = args.user {
        cfg.ssh_username.clone_from(user);
    }
    if let Some(port) = args.port {
        cfg.rpc_port = port;
    }
    if let Some(ref user) = args.rpc_user {
        cfg.rpc_username.clone_from(user);
    }
    if let Some(ref root) = args.backup_root {
        cfg.backup_root.clone_from(root);
    }
    if let Some(ref profile) = args.device_profile {
        cfg.device_profile.clone_from(profile);
    }
    if args.no_filter {
        cfg.use_filter = false;
    }
}

/// SSH password: env → keyring → interactive prompt.
pub fn ssh_password(cfg: &Config) -> Result<SecretString, CliError> {
    if let Some(pw) = ncsync_config::resolve_ssh_password(cfg) {
        return Ok(pw);
    }
    prompt_secret(&format!("SSH password for {}: ", cfg.ssh_username))
}

/// NETCONF password from the credential chain.
pub fn rpc_password(cfg: &Config) -> Result<SecretString, CliError> {
    Ok(ncsync_config::resolve_rpc_password(cfg)?)
}

/// Read a secret from the terminal without echo.
pub fn prompt_secret(prompt: &str) -> Result<SecretString, CliError> {
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractive {
            what: prompt.trim_end_matches([':', ' ']).to_owned(),
        });
    }
    let secret = rpassword::prompt_password(prompt).map_err(CliError::prompt)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(SecretString::from(secret))
}
