// Shared transport configuration for both session kinds.
//
// The CLI and NETCONF sessions share host-key policy, timeouts and the
// blocking runtime builder through this module, avoiding duplicated
// setup logic.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;

use crate::error::Error;

/// How server host keys are verified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Accept any host key (lab devices with regenerated keys).
    #[default]
    AcceptAny,
    /// Accept only keys whose SHA-256 fingerprint (`SHA256:...`) is listed.
    Pinned(Vec<String>),
}

impl HostKeyPolicy {
    /// Whether a key with the given fingerprint is trusted.
    pub fn trusts(&self, fingerprint: &str) -> bool {
        match self {
            Self::AcceptAny => true,
            Self::Pinned(allowed) => allowed.iter().any(|f| f == fingerprint),
        }
    }
}

/// Shared transport configuration for building sessions.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Upper bound for connect, authentication, and each individual exchange.
    pub timeout: Duration,
    pub host_key: HostKeyPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            host_key: HostKeyPolicy::default(),
        }
    }
}

impl TransportConfig {
    /// Build the `russh` client configuration.
    pub(crate) fn ssh_config(&self) -> Arc<russh::client::Config> {
        Arc::new(russh::client::Config {
            inactivity_timeout: Some(self.timeout.saturating_mul(4)),
            ..Default::default()
        })
    }

    /// Build the single-threaded runtime a session drives its I/O on.
    ///
    /// Tasks spawned by the SSH library only make progress while the owning
    /// session is inside [`block_on`], so nothing runs between calls.
    pub(crate) fn build_runtime() -> Result<Runtime, Error> {
        Ok(tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?)
    }
}

/// Run `fut` to completion on `rt`, failing with [`Error::Timeout`] after `timeout`.
pub(crate) fn block_on<T, F>(
    rt: &Runtime,
    timeout: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    rt.block_on(async {
        tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| Error::Timeout { operation, timeout })?
    })
}
