//! Configuration for ncsync.
//!
//! A single TOML file layered under `NCSYNC_*` environment variables,
//! credential resolution (env + keyring + plaintext), and translation to
//! the `ncsync_core` run settings. The CLI adds flag-aware wrappers on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ncsync_core::{
    Credentials, DeviceProfile, HostKeyPolicy, Mode, ReconcileConfig, SshConnector,
    TransportConfig,
};

/// Service name for keyring entries.
pub const KEYRING_SERVICE: &str = "ncsync";

/// Environment variable holding the NETCONF password unless overridden
/// by `rpc_password_env`.
pub const RPC_PASSWORD_ENV: &str = "NCSYNC_RPC_PASSWORD";

/// Environment variable holding the SSH password.
pub const SSH_PASSWORD_ENV: &str = "NCSYNC_SSH_PASSWORD";

const ENV_PREFIX: &str = "NCSYNC_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {kind} password found for user '{username}'")]
    NoCredentials {
        kind: SecretKind,
        username: String,
    },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Account used for the interactive SSH session.
    pub ssh_username: String,

    pub ssh_port: u16,

    /// NETCONF service account; provisioned on devices that lack it.
    pub rpc_username: String,

    pub rpc_port: u16,

    /// NETCONF password (plaintext; prefer keyring or env var).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_password: Option<String>,

    /// Name of an environment variable holding the NETCONF password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_password_env: Option<String>,

    /// Root directory for backups.
    pub backup_root: PathBuf,

    /// Directory for the append-only log file.
    pub log_dir: PathBuf,

    /// Per-operation timeout in seconds.
    pub timeout: u64,

    /// `nokia` or `generic`.
    pub device_profile: String,

    /// Scope `<get-config>` to the vendor configuration tree.
    pub use_filter: bool,

    /// Re-check NETCONF state after applying the enable batch.
    pub verify_after_apply: bool,

    /// Pinned host key fingerprints (`SHA256:...`). Empty accepts any key.
    pub host_keys: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ssh_username: "admin".into(),
            ssh_port: 22,
            rpc_username: "netconf".into(),
            rpc_port: ncsync_core::DEFAULT_RPC_PORT,
            rpc_password: None,
            rpc_password_env: None,
            backup_root: PathBuf::from("backups"),
            log_dir: PathBuf::from("logging"),
            timeout: 30,
            device_profile: DeviceProfile::default().name().into(),
            use_filter: true,
            verify_after_apply: true,
            host_keys: Vec::new(),
        }
    }
}

impl Config {
    pub fn device_profile(&self) -> Result<DeviceProfile, ConfigError> {
        self.device_profile
            .parse()
            .map_err(|reason| ConfigError::Validation {
                field: "device_profile".into(),
                reason,
            })
    }

    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        Ok(Duration::from_secs(self.timeout))
    }

    pub fn host_key_policy(&self) -> HostKeyPolicy {
        if self.host_keys.is_empty() {
            HostKeyPolicy::AcceptAny
        } else {
            HostKeyPolicy::Pinned(self.host_keys.clone())
        }
    }

    pub fn transport_config(&self) -> Result<TransportConfig, ConfigError> {
        Ok(TransportConfig {
            timeout: self.timeout()?,
            host_key: self.host_key_policy(),
        })
    }

    /// Build the production connector.
    pub fn connector(&self) -> Result<SshConnector, ConfigError> {
        Ok(
            SshConnector::new(self.transport_config()?, self.device_profile()?)
                .with_ssh_port(self.ssh_port),
        )
    }

    /// Run settings for `mode`; `rpc_password` is the resolved NETCONF secret.
    pub fn reconcile_config(
        &self,
        rpc_password: SecretString,
        mode: Mode,
    ) -> Result<ReconcileConfig, ConfigError> {
        let profile = self.device_profile()?;
        let mut config = ReconcileConfig::new(
            Credentials::new(self.rpc_username.clone(), rpc_password),
            &self.backup_root,
        );
        config.rpc_filter = if self.use_filter {
            profile.running_config_filter()
        } else {
            None
        };
        config.verify_after_apply = self.verify_after_apply;
        config.mode = mode;
        Ok(config)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "ncsync", "ncsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("ncsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Password variables are excluded from the env layer; they are read only
/// by the credential chain.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["rpc_password", "ssh_password"]));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Which password a keyring entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Ssh,
    Rpc,
}

impl SecretKind {
    fn keyring_user(self, username: &str) -> String {
        match self {
            Self::Ssh => format!("ssh/{username}"),
            Self::Rpc => format!("rpc/{username}"),
        }
    }
}

impl std::fmt::Display for SecretKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Ssh => "SSH",
            Self::Rpc => "NETCONF",
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn keyring_get(account: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, account)
        .ok()
        .and_then(|entry| entry.get_password().ok())
}

/// NETCONF password: env var → keyring → plaintext config.
pub fn resolve_rpc_password(cfg: &Config) -> Result<SecretString, ConfigError> {
    resolve_rpc_password_with(cfg, env_var, keyring_get)
}

fn resolve_rpc_password_with(
    cfg: &Config,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Configured env var name, else the default one
    let env_name = cfg.rpc_password_env.as_deref().unwrap_or(RPC_PASSWORD_ENV);
    if let Some(pw) = env(env_name) {
        return Ok(SecretString::from(pw));
    }

    // 2. System keyring
    if let Some(pw) = keyring(&SecretKind::Rpc.keyring_user(&cfg.rpc_username)) {
        return Ok(SecretString::from(pw));
    }

    // 3. Plaintext in config
    if let Some(ref pw) = cfg.rpc_password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        kind: SecretKind::Rpc,
        username: cfg.rpc_username.clone(),
    })
}

/// SSH password from env var or keyring. `None` means the caller must
/// prompt.
pub fn resolve_ssh_password(cfg: &Config) -> Option<SecretString> {
    resolve_ssh_password_with(cfg, env_var, keyring_get)
}

fn resolve_ssh_password_with(
    cfg: &Config,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    env(SSH_PASSWORD_ENV)
        .or_else(|| keyring(&SecretKind::Ssh.keyring_user(&cfg.ssh_username)))
        .map(SecretString::from)
}

/// Store a password in the system keyring.
pub fn store_secret(kind: SecretKind, username: &str, secret: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &kind.keyring_user(username))
        .map_err(|e| ConfigError::Keyring(e.to_string()))?;
    entry
        .set_password(secret)
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}
