//! Clap derive structures for the `ncsync` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ncsync -- enable NETCONF on SR OS routers and back up their configuration
#[derive(Debug, Parser)]
#[command(
    name = "ncsync",
    version,
    about = "Enable NETCONF on Nokia SR OS routers and back up their running configuration",
    long_about = "Logs in to each router over SSH, checks whether NETCONF is enabled and \
        enables it if not,\nthen retrieves the running configuration over NETCONF and \
        writes it to\n<backup-root>/<system-name>/<system-name>.txt.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, short = 'C', env = "NCSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NCSYNC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Per-operation timeout in seconds (overrides config)
    #[arg(long, env = "NCSYNC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Enable NETCONF where needed, then back up every target
    Run(TargetArgs),

    /// Back up targets over NETCONF only (no CLI session, no changes)
    #[command(alias = "b")]
    Backup(TargetArgs),

    /// Report whether NETCONF is enabled on each target (read-only)
    #[command(alias = "st")]
    Status(TargetArgs),

    /// Manage configuration and stored passwords
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Target selection ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Device address or hostname (repeatable)
    #[arg(
        long = "node",
        short = 'n',
        value_name = "ADDRESS",
        required_unless_present = "inventory"
    )]
    pub nodes: Vec<String>,

    /// File with one device address per line ('#' starts a comment)
    #[arg(long, short = 'i', value_name = "FILE")]
    pub inventory: Option<PathBuf>,

    /// SSH username for the CLI session
    #[arg(long, short = 'u', env = "NCSYNC_SSH_USERNAME")]
    pub user: Option<String>,

    /// NETCONF port
    #[arg(long, short = 'p', env = "NCSYNC_RPC_PORT")]
    pub port: Option<u16>,

    /// NETCONF service account to provision and log in with
    #[arg(long, env = "NCSYNC_RPC_USERNAME")]
    pub rpc_user: Option<String>,

    /// Root directory for backups
    #[arg(long, short = 'b', env = "NCSYNC_BACKUP_ROOT", value_name = "DIR")]
    pub backup_root: Option<PathBuf>,

    /// Device profile: nokia or generic
    #[arg(long, env = "NCSYNC_DEVICE_PROFILE")]
    pub device_profile: Option<String>,

    /// Retrieve the whole running datastore instead of the vendor subtree
    #[arg(long)]
    pub no_filter: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a configuration file with default values
    Init,

    /// Show the effective configuration (file + environment)
    Show,

    /// Print the configuration file path
    Path,

    /// Store a password in the system keyring
    SetPassword {
        /// Which password to store
        #[arg(value_enum)]
        target: SecretTarget,

        /// Account name (defaults to the configured username)
        #[arg(long, short = 'u')]
        user: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SecretTarget {
    /// SSH password for the CLI session
    Ssh,
    /// NETCONF service-account password
    Rpc,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
