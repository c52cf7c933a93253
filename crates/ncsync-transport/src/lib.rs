// ncsync-transport: Blocking SSH transports for SR OS management (interactive CLI + NETCONF)

pub mod cli;
pub mod error;
pub mod netconf;
mod ssh;
pub mod transport;

pub use cli::CliSession;
pub use error::Error;
pub use netconf::{DeviceProfile, NetconfSession, ServerHello};
pub use transport::{HostKeyPolicy, TransportConfig};
