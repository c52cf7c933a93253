use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `ncsync-transport` crate.
///
/// Covers every failure mode of both session kinds: SSH connection and
/// authentication, channel setup, CLI command exchange, NETCONF framing and
/// `<rpc-error>` replies. `ncsync-core` maps these into its error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Connection ──────────────────────────────────────────────────
    /// TCP connect or SSH handshake failed.
    #[error("SSH connection to {address} failed: {message}")]
    Connect { address: String, message: String },

    /// Server rejected the supplied credentials.
    #[error("Authentication failed for user '{username}' on {address}")]
    Authentication { address: String, username: String },

    /// Server host key did not match any pinned fingerprint.
    #[error("Host key for {address} is not trusted (fingerprint {fingerprint})")]
    UntrustedHostKey { address: String, fingerprint: String },

    /// Opening a session channel, PTY, shell, or subsystem failed.
    #[error("Channel error: {0}")]
    Channel(String),

    /// The operation did not complete within the configured timeout.
    #[error("Timed out after {}s waiting for {operation}", .timeout.as_secs())]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// The remote side closed the channel before the exchange completed.
    #[error("Channel closed by remote while waiting for {0}")]
    Closed(&'static str),

    // ── CLI ─────────────────────────────────────────────────────────
    /// The device answered a command with an error message. The command
    /// itself is not kept: configuration lines may carry secrets.
    #[error("Command rejected: {message}")]
    Rejected { message: String },

    // ── NETCONF ─────────────────────────────────────────────────────
    /// Malformed NETCONF framing (bad chunk header, invalid UTF-8, ...).
    #[error("NETCONF framing error: {0}")]
    Framing(String),

    /// The `<hello>` exchange failed or advertised no usable base capability.
    #[error("NETCONF hello failed: {0}")]
    Hello(String),

    /// The server replied with one or more `<rpc-error>` elements.
    #[error("NETCONF rpc-error ({tag}): {message}")]
    Rpc { tag: String, message: String },

    /// Operation attempted on a session that is already closed.
    #[error("Session already closed")]
    SessionClosed,

    // ── Runtime ─────────────────────────────────────────────────────
    /// Building the blocking runtime failed.
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    /// Error bubbled up from the SSH library.
    #[error("SSH protocol error: {0}")]
    Ssh(#[from] russh::Error),
}

impl Error {
    /// Returns `true` if this error happened while establishing the session
    /// (before any command or RPC was exchanged).
    pub fn is_connect(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Authentication { .. } | Self::UntrustedHostKey { .. }
        )
    }

    /// Returns `true` if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
