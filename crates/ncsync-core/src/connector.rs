// ── Production connector ──
//
// Binds the session traits to the blocking SSH transports and translates
// transport errors into the core taxonomy.

use ncsync_transport::{CliSession, DeviceProfile, NetconfSession, TransportConfig};
use tracing::debug;

use crate::error::CoreError;
use crate::model::{Device, Protocol};
use crate::session::{Connector, InteractiveSession, RpcSession, Session};

/// Default SSH port for the CLI session.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Opens real SSH CLI and NETCONF sessions.
#[derive(Debug, Clone)]
pub struct SshConnector {
    transport: TransportConfig,
    profile: DeviceProfile,
    ssh_port: u16,
}

impl SshConnector {
    pub fn new(transport: TransportConfig, profile: DeviceProfile) -> Self {
        Self {
            transport,
            profile,
            ssh_port: DEFAULT_SSH_PORT,
        }
    }

    #[must_use]
    pub fn with_ssh_port(mut self, port: u16) -> Self {
        self.ssh_port = port;
        self
    }
}

impl Connector for SshConnector {
    type Interactive = CliSession;
    type Rpc = NetconfSession;

    fn open_interactive(&self, device: &Device) -> Result<CliSession, CoreError> {
        let creds = device.ssh();
        debug!(device = device.address(), port = self.ssh_port, user = %creds.username, "opening CLI session");
        CliSession::connect(
            device.address(),
            self.ssh_port,
            &creds.username,
            &creds.password,
            &self.transport,
        )
        .map_err(|e| connect_error(Protocol::Ssh, device.address(), &e))
    }

    fn open_rpc(&self, device: &Device) -> Result<NetconfSession, CoreError> {
        let creds = device.rpc();
        debug!(device = device.address(), port = device.rpc_port(), user = %creds.username, "opening NETCONF session");
        NetconfSession::connect(
            device.address(),
            device.rpc_port(),
            &creds.username,
            &creds.password,
            self.profile,
            &self.transport,
        )
        .map_err(|e| connect_error(Protocol::Netconf, device.address(), &e))
    }
}

fn connect_error(protocol: Protocol, address: &str, e: &ncsync_transport::Error) -> CoreError {
    CoreError::Connect {
        protocol,
        address: address.to_owned(),
        reason: e.to_string(),
    }
}

fn command_error(e: ncsync_transport::Error) -> CoreError {
    let reason = match e {
        ncsync_transport::Error::Rejected { message } => message,
        other => other.to_string(),
    };
    CoreError::Command { reason }
}

impl Session for CliSession {
    fn protocol(&self) -> Protocol {
        Protocol::Ssh
    }

    fn close(&mut self) -> Result<(), CoreError> {
        self.disconnect().map_err(command_error)
    }
}

impl InteractiveSession for CliSession {
    fn send_command(&mut self, command: &str) -> Result<String, CoreError> {
        CliSession::send_command(self, command).map_err(command_error)
    }
}

impl Session for NetconfSession {
    fn protocol(&self) -> Protocol {
        Protocol::Netconf
    }

    fn close(&mut self) -> Result<(), CoreError> {
        NetconfSession::close(self).map_err(|e| CoreError::Retrieve {
            reason: e.to_string(),
        })
    }
}

impl RpcSession for NetconfSession {
    fn get_running_config(&mut self, filter: Option<&str>) -> Result<String, CoreError> {
        NetconfSession::get_running_config(self, filter).map_err(|e| CoreError::Retrieve {
            reason: e.to_string(),
        })
    }
}
