// Interactive CLI session
//
// A PTY-backed shell channel to an SR OS node. Commands are written one
// line at a time and output is collected until the node prints its prompt
// again. Both the classic CLI (`A:PE1# `) and MD-CLI (`A:admin@PE1# `)
// prompt shapes are recognised.

use std::time::Duration;

use russh::ChannelMsg;
use russh::client::{Handle, Msg};
use secrecy::SecretString;
use tokio::runtime::Runtime;
use tracing::{debug, trace};

use crate::error::Error;
use crate::ssh::{self, ClientHandler};
use crate::transport::{TransportConfig, block_on};

type Channel = russh::Channel<Msg>;

/// Prefixes SR OS uses for command errors in both CLI engines.
const REJECTION_PREFIXES: &[&str] = &["Error:", "MINOR:", "MAJOR:", "CRITICAL:"];

/// Blocking interactive CLI session to one device.
pub struct CliSession {
    address: String,
    timeout: Duration,
    rt: Runtime,
    handle: Option<Handle<ClientHandler>>,
    channel: Option<Channel>,
}

impl CliSession {
    /// Log in, wait for the first prompt, and disable output paging.
    pub fn connect(
        address: &str,
        port: u16,
        username: &str,
        password: &SecretString,
        config: &TransportConfig,
    ) -> Result<Self, Error> {
        let rt = TransportConfig::build_runtime()?;

        let (handle, channel, banner) = block_on(&rt, config.timeout, "CLI login", async {
            let handle = ssh::connect(address, port, username, password, config).await?;
            let mut channel = handle
                .channel_open_session()
                .await
                .map_err(|e| Error::Channel(format!("open session: {e}")))?;
            channel
                .request_pty(false, "vt100", 511, 24, 0, 0, &[])
                .await
                .map_err(|e| Error::Channel(format!("request pty: {e}")))?;
            channel
                .request_shell(false)
                .await
                .map_err(|e| Error::Channel(format!("request shell: {e}")))?;
            let banner = read_until_prompt(&mut channel).await?;
            Ok((handle, channel, banner))
        })?;

        let md_cli = last_line(&banner).contains('@');
        debug!(address, md_cli, "CLI prompt reached");

        let mut session = Self {
            address: address.to_owned(),
            timeout: config.timeout,
            rt,
            handle: Some(handle),
            channel: Some(channel),
        };

        let paging = if md_cli {
            "environment more false"
        } else {
            "environment no more"
        };
        session.exchange(paging)?;

        Ok(session)
    }

    /// The device address this session is connected to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send one command and return its output (echo and trailing prompt removed).
    ///
    /// Fails with [`Error::Rejected`] when the node answers with an error line.
    pub fn send_command(&mut self, command: &str) -> Result<String, Error> {
        let output = self.exchange(command)?;
        if let Some(message) = rejection(&output) {
            return Err(Error::Rejected {
                message: message.to_owned(),
            });
        }
        Ok(output)
    }

    /// Close the shell and the SSH connection. Calling it twice is a no-op.
    pub fn disconnect(&mut self) -> Result<(), Error> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let channel = self.channel.take();
        debug!(address = %self.address, "closing CLI session");

        block_on(&self.rt, self.timeout, "CLI logout", async move {
            if let Some(channel) = channel {
                let _ = channel.data(&b"logout\n"[..]).await;
                let _ = channel.eof().await;
            }
            ssh::disconnect(&handle).await
        })
    }

    fn exchange(&mut self, command: &str) -> Result<String, Error> {
        let channel = self.channel.as_mut().ok_or(Error::SessionClosed)?;
        log_outgoing(&self.address, command);

        let raw = block_on(&self.rt, self.timeout, "command output", async {
            let line = format!("{command}\n");
            channel.data(line.as_bytes()).await?;
            read_until_prompt(channel).await
        })?;

        Ok(clean_output(&raw, command))
    }
}

/// Command text is never logged; batch lines may carry passwords.
fn log_outgoing(address: &str, command: &str) {
    trace!(address, bytes = command.len(), "sending command");
}

/// Raw output bytes collected until the prompt. Decoded once, so
/// multi-byte characters split across packets survive.
#[derive(Debug, Default)]
struct OutputBuffer {
    bytes: Vec<u8>,
}

impl OutputBuffer {
    fn push(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    fn at_prompt(&self) -> bool {
        let start = self
            .bytes
            .iter()
            .rposition(|b| matches!(b, b'\n' | b'\r'))
            .map_or(0, |pos| pos + 1);
        is_prompt(&String::from_utf8_lossy(&self.bytes[start..]))
    }

    fn into_text(self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

async fn read_until_prompt(channel: &mut Channel) -> Result<String, Error> {
    let mut buffer = OutputBuffer::default();
    loop {
        if buffer.at_prompt() {
            return Ok(buffer.into_text());
        }
        match channel.wait().await {
            Some(ChannelMsg::Data { data } | ChannelMsg::ExtendedData { data, .. }) => {
                buffer.push(&data);
            }
            Some(ChannelMsg::Eof | ChannelMsg::Close) | None => {
                return Err(Error::Closed("CLI prompt"));
            }
            Some(_) => {}
        }
    }
}

fn last_line(text: &str) -> &str {
    text.rsplit(['\n', '\r']).next().unwrap_or_default()
}

/// `A:PE1#`, `*A:PE1>config>system#`, `A:admin@PE1#` (standby CPM uses `B:`).
fn is_prompt(line: &str) -> bool {
    let line = line.trim();
    let body = line.strip_prefix('*').unwrap_or(line);
    (body.starts_with("A:") || body.starts_with("B:")) && (body.ends_with('#') || body.ends_with('>'))
}

/// Normalise line endings, drop the echoed command and the trailing prompt.
fn clean_output(raw: &str, command: &str) -> String {
    let normalised = raw.replace("\r\n", "\n").replace('\r', "");
    let mut lines: Vec<&str> = normalised.lines().collect();

    if lines.last().is_some_and(|l| is_prompt(l)) {
        lines.pop();
    }
    if lines.first().is_some_and(|l| l.trim_end().ends_with(command.trim())) {
        lines.remove(0);
    }

    lines.join("\n").trim_matches('\n').to_owned()
}

/// First error line in a command's output, if any.
fn rejection(output: &str) -> Option<&str> {
    output.lines().map(str::trim).find(|line| {
        REJECTION_PREFIXES
            .iter()
            .any(|prefix| line.starts_with(prefix))
    })
}
