// ── Session abstractions ──
//
// The orchestrator talks to devices only through these traits, so the
// production SSH/NETCONF transports and in-memory test doubles are
// interchangeable. `Scoped` guarantees a session is closed exactly once on
// every exit path.

use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{Device, ProbeResult, Protocol};

/// Anything that holds a remote connection open.
pub trait Session {
    fn protocol(&self) -> Protocol;

    /// Release the connection. Must tolerate being called on an already
    /// closed session.
    fn close(&mut self) -> Result<(), CoreError>;
}

/// An interactive CLI session.
pub trait InteractiveSession: Session {
    /// Send one command line and return its textual output.
    fn send_command(&mut self, command: &str) -> Result<String, CoreError>;

    /// Run a read-only probe command.
    fn probe(&mut self, command: &str) -> Result<ProbeResult, CoreError> {
        self.send_command(command)
            .map(|raw_text| ProbeResult { raw_text })
    }
}

/// A NETCONF session.
pub trait RpcSession: Session {
    /// Raw `<rpc-reply>` for `<get-config>` on the running datastore.
    fn get_running_config(&mut self, filter: Option<&str>) -> Result<String, CoreError>;
}

/// Opens sessions to devices.
pub trait Connector {
    type Interactive: InteractiveSession;
    type Rpc: RpcSession;

    fn open_interactive(&self, device: &Device) -> Result<Self::Interactive, CoreError>;

    fn open_rpc(&self, device: &Device) -> Result<Self::Rpc, CoreError>;
}

/// Owns a session and closes it when finished or dropped.
///
/// Close errors are logged and swallowed: they never change a device's
/// outcome.
pub struct Scoped<S: Session> {
    session: S,
    address: String,
    closed: bool,
}

impl<S: Session> Scoped<S> {
    pub fn new(session: S, address: impl Into<String>) -> Self {
        Self {
            session,
            address: address.into(),
            closed: false,
        }
    }

    /// Close now instead of at end of scope.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let protocol = self.session.protocol();
        match self.session.close() {
            Ok(()) => debug!(device = %self.address, %protocol, "session closed"),
            Err(e) => warn!(device = %self.address, %protocol, error = %e, "session close failed"),
        }
    }
}

impl<S: Session> Deref for Scoped<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: Session> DerefMut for Scoped<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: Session> Drop for Scoped<S> {
    fn drop(&mut self) {
        self.release();
    }
}
