// NETCONF-over-SSH session
//
// Opens the `netconf` SSH subsystem, exchanges `<hello>` messages,
// negotiates framing, and issues `<get-config>` / `<close-session>` RPCs.
// Replies are returned verbatim so callers can persist them byte-for-byte.

pub mod framing;
mod message;
mod profile;

use std::time::Duration;

use russh::ChannelMsg;
use russh::client::{Handle, Msg};
use secrecy::SecretString;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::error::Error;
use crate::ssh::{self, ClientHandler};
use crate::transport::{TransportConfig, block_on};

pub use framing::{Decoder, Framing};
pub use message::{BASE_1_0, BASE_1_1, ServerHello, check_reply};
pub use profile::DeviceProfile;

type Channel = russh::Channel<Msg>;

/// Blocking NETCONF session to one device.
pub struct NetconfSession {
    address: String,
    timeout: Duration,
    rt: Runtime,
    handle: Option<Handle<ClientHandler>>,
    channel: Option<Channel>,
    decoder: Decoder,
    framing: Framing,
    next_message_id: u64,
}

impl NetconfSession {
    /// Connect, open the `netconf` subsystem, and complete the hello exchange.
    pub fn connect(
        address: &str,
        port: u16,
        username: &str,
        password: &SecretString,
        profile: DeviceProfile,
        config: &TransportConfig,
    ) -> Result<Self, Error> {
        let rt = TransportConfig::build_runtime()?;
        let mut decoder = Decoder::new(Framing::EndOfMessage);

        let (handle, channel, hello) = block_on(&rt, config.timeout, "NETCONF hello", async {
            let handle = ssh::connect(address, port, username, password, config).await?;
            let mut channel = handle
                .channel_open_session()
                .await
                .map_err(|e| Error::Channel(format!("open session: {e}")))?;
            channel
                .request_subsystem(true, "netconf")
                .await
                .map_err(|e| Error::Channel(format!("netconf subsystem: {e}")))?;

            let client_hello = Framing::EndOfMessage.encode(&message::client_hello(profile));
            channel.data(client_hello.as_bytes()).await?;

            let raw = read_message(&mut channel, &mut decoder).await?;
            let hello = ServerHello::parse(&raw)?;
            Ok((handle, channel, hello))
        })?;

        let framing = if hello.supports(BASE_1_1) {
            Framing::Chunked
        } else {
            Framing::EndOfMessage
        };
        decoder.set_framing(framing);

        debug!(
            address,
            session_id = hello.session_id.as_deref().unwrap_or("-"),
            ?framing,
            profile = profile.name(),
            "NETCONF session established"
        );

        Ok(Self {
            address: address.to_owned(),
            timeout: config.timeout,
            rt,
            handle: Some(handle),
            channel: Some(channel),
            decoder,
            framing,
            next_message_id: 1,
        })
    }

    /// `<get-config>` on the running datastore, optionally scoped by a
    /// subtree filter. Returns the raw `<rpc-reply>` document.
    pub fn get_running_config(&mut self, filter: Option<&str>) -> Result<String, Error> {
        let message_id = self.take_message_id();
        let rpc = message::get_config(message_id, filter);
        debug!(address = %self.address, message_id, filtered = filter.is_some(), "get-config running");
        let reply = self.rpc(&rpc, "get-config reply")?;
        check_reply(&reply)?;
        Ok(reply)
    }

    /// Send `<close-session>` and tear down the SSH connection.
    ///
    /// A second call is a no-op. The connection is dropped even when the
    /// server answers `<close-session>` with an error.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.handle.is_none() {
            return Ok(());
        }

        let message_id = self.take_message_id();
        let rpc = message::close_session(message_id);
        let close_result = self
            .rpc(&rpc, "close-session reply")
            .and_then(|reply| check_reply(&reply));
        if let Err(ref e) = close_result {
            warn!(address = %self.address, error = %e, "close-session not acknowledged");
        }

        self.channel = None;
        let disconnect_result = match self.handle.take() {
            Some(handle) => block_on(&self.rt, self.timeout, "SSH disconnect", async move {
                ssh::disconnect(&handle).await
            }),
            None => Ok(()),
        };

        debug!(address = %self.address, "NETCONF session closed");
        close_result.and(disconnect_result)
    }

    fn take_message_id(&mut self) -> u64 {
        let id = self.next_message_id;
        self.next_message_id += 1;
        id
    }

    fn rpc(&mut self, rpc: &str, operation: &'static str) -> Result<String, Error> {
        let channel = self.channel.as_mut().ok_or(Error::SessionClosed)?;
        let decoder = &mut self.decoder;
        let payload = self.framing.encode(rpc);

        block_on(&self.rt, self.timeout, operation, async {
            channel.data(payload.as_bytes()).await?;
            read_message(channel, decoder).await
        })
    }
}

async fn read_message(channel: &mut Channel, decoder: &mut Decoder) -> Result<String, Error> {
    loop {
        if let Some(message) = decoder.next_message()? {
            return Ok(message);
        }
        match channel.wait().await {
            Some(ChannelMsg::Data { data }) => decoder.push(&data),
            Some(ChannelMsg::Eof | ChannelMsg::Close) | None => {
                return Err(Error::Closed("NETCONF message"));
            }
            Some(_) => {}
        }
    }
}
