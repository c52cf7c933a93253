// SSH connection setup shared by the CLI and NETCONF sessions.
//
// Opens the TCP stream, runs the `russh` handshake with host-key checking
// according to `HostKeyPolicy`, and authenticates with a password.

use std::sync::{Arc, OnceLock};

use russh::client::{self, Handle};
use russh::keys::ssh_key::{HashAlg, PublicKey};
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::error::Error;
use crate::transport::{HostKeyPolicy, TransportConfig};

/// `russh` client handler: host-key verification only.
pub(crate) struct ClientHandler {
    policy: HostKeyPolicy,
    /// Fingerprint of the key the server presented, for error reporting.
    seen_key: Arc<OnceLock<String>>,
}

impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint(HashAlg::Sha256).to_string();
        let trusted = self.policy.trusts(&fingerprint);
        if !trusted {
            warn!(%fingerprint, "server host key not in pinned set");
        }
        let _ = self.seen_key.set(fingerprint);
        Ok(trusted)
    }
}

/// Connect and password-authenticate to `address:port`.
pub(crate) async fn connect(
    address: &str,
    port: u16,
    username: &str,
    password: &SecretString,
    config: &TransportConfig,
) -> Result<Handle<ClientHandler>, Error> {
    debug!(address, port, "opening SSH connection");

    let stream = TcpStream::connect((address, port))
        .await
        .map_err(|e| Error::Connect {
            address: address.to_owned(),
            message: e.to_string(),
        })?;

    let seen_key = Arc::new(OnceLock::new());
    let handler = ClientHandler {
        policy: config.host_key.clone(),
        seen_key: Arc::clone(&seen_key),
    };

    let mut handle = client::connect_stream(config.ssh_config(), stream, handler)
        .await
        .map_err(|e| match e {
            russh::Error::UnknownKey => Error::UntrustedHostKey {
                address: address.to_owned(),
                fingerprint: seen_key.get().cloned().unwrap_or_default(),
            },
            other => Error::Connect {
                address: address.to_owned(),
                message: other.to_string(),
            },
        })?;

    let auth = handle
        .authenticate_password(username, password.expose_secret())
        .await
        .map_err(|e| Error::Connect {
            address: address.to_owned(),
            message: format!("authentication exchange failed: {e}"),
        })?;

    if !auth.success() {
        return Err(Error::Authentication {
            address: address.to_owned(),
            username: username.to_owned(),
        });
    }

    debug!(address, username, "SSH session authenticated");
    Ok(handle)
}

/// Politely end the SSH connection.
pub(crate) async fn disconnect(handle: &Handle<ClientHandler>) -> Result<(), Error> {
    handle
        .disconnect(russh::Disconnect::ByApplication, "", "en")
        .await?;
    Ok(())
}
