//! Config subcommand handlers.

use dialoguer::Confirm;
use secrecy::ExposeSecret;

use ncsync_config::{Config, SecretKind};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat, SecretTarget};
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: write defaults ────────────────────────────────────
        ConfigCommand::Init => {
            let path = config::active_path(global);
            if path.exists() && !global.yes {
                let overwrite = Confirm::new()
                    .with_prompt(format!("{} exists. Overwrite with defaults?", path.display()))
                    .default(false)
                    .interact()
                    .map_err(CliError::prompt)?;
                if !overwrite {
                    return Ok(());
                }
            }
            ncsync_config::save_config_to(&Config::default(), &path)?;
            if !global.quiet {
                eprintln!("✓ Configuration written to {}", path.display());
                eprintln!("  Store the NETCONF password with: ncsync config set-password rpc");
            }
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let mut cfg = config::load(global)?;
            if cfg.rpc_password.is_some() {
                cfg.rpc_password = Some(REDACTED.into());
            }
            let rendered = match global.output {
                OutputFormat::Table => toml::to_string_pretty(&cfg)?,
                OutputFormat::Json => output::render_json(&cfg, false)?,
                OutputFormat::JsonCompact => output::render_json(&cfg, true)?,
            };
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::active_path(global).display());
            Ok(())
        }

        // ── SetPassword: keyring storage ────────────────────────────
        ConfigCommand::SetPassword { target, user } => {
            let cfg = config::load(global)?;
            let (kind, username) = match target {
                SecretTarget::Ssh => (SecretKind::Ssh, user.unwrap_or(cfg.ssh_username)),
                SecretTarget::Rpc => (SecretKind::Rpc, user.unwrap_or(cfg.rpc_username)),
            };

            let secret = config::prompt_secret(&format!("{kind} password for {username}: "))?;
            if !global.yes {
                let store = Confirm::new()
                    .with_prompt(format!(
                        "Store {kind} password for '{username}' in the system keyring?"
                    ))
                    .default(true)
                    .interact()
                    .map_err(CliError::prompt)?;
                if !store {
                    return Ok(());
                }
            }

            ncsync_config::store_secret(kind, &username, secret.expose_secret())?;
            if !global.quiet {
                eprintln!("✓ {kind} password for '{username}' stored in system keyring");
            }
            Ok(())
        }
    }
}
