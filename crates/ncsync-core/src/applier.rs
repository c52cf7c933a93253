// ── Enable-NETCONF configuration batch ──
//
// Thirteen classic-CLI lines that provision the NETCONF service account,
// load the Nokia YANG modules, start the service, and switch the node to
// model-driven configuration. Sent strictly in order; a rejected line is
// logged and the batch continues.

use std::fmt;

use secrecy::ExposeSecret;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::model::Credentials;
use crate::session::InteractiveSession;

/// Security profile granted to the NETCONF service account.
pub const NETCONF_PROFILE: &str = "netconf";

const REDACTED: &str = "********";

/// One configuration line. Lines carrying a secret render redacted.
#[derive(Clone)]
pub struct ConfigLine {
    text: String,
    redacted: Option<String>,
}

impl ConfigLine {
    fn plain(text: String) -> Self {
        Self {
            text,
            redacted: None,
        }
    }

    fn sensitive(text: String, redacted: String) -> Self {
        Self {
            text,
            redacted: Some(redacted),
        }
    }

    /// The exact text sent to the device.
    pub fn expose(&self) -> &str {
        &self.text
    }

    pub fn is_sensitive(&self) -> bool {
        self.redacted.is_some()
    }
}

impl fmt::Display for ConfigLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.redacted.as_deref().unwrap_or(&self.text))
    }
}

impl fmt::Debug for ConfigLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConfigLine").field(&self.to_string()).finish()
    }
}

/// Ordered configuration lines applied as one best-effort batch.
#[derive(Debug, Clone)]
pub struct CommandBatch {
    lines: Vec<ConfigLine>,
}

impl CommandBatch {
    /// The batch that enables NETCONF and provisions `account` for it.
    ///
    /// Order matters: the security profile exists before the user joins it,
    /// YANG modules are loaded before the service starts, and the switch to
    /// model-driven mode comes last.
    ///
    /// The username and password are sent inside double quotes, so values
    /// containing `"`, `\` or control characters are refused.
    pub fn enable_netconf(account: &Credentials) -> Result<Self, CoreError> {
        quotable("service account username", &account.username)?;
        quotable("service account password", account.password.expose_secret())?;

        let user = &account.username;
        let profile = NETCONF_PROFILE;
        let password_line = |password: &str| {
            format!(r#"/configure system security user "{user}" password "{password}""#)
        };

        let lines = vec![
            ConfigLine::plain(format!(
                r#"/configure system security profile "{profile}" netconf base-op-authorization lock"#
            )),
            ConfigLine::plain(format!(
                r#"/configure system security profile "{profile}" netconf base-op-authorization kill-session"#
            )),
            ConfigLine::plain(format!(
                r#"/configure system security user "{user}" access netconf"#
            )),
            ConfigLine::sensitive(
                password_line(account.password.expose_secret()),
                password_line(REDACTED),
            ),
            ConfigLine::plain(format!(
                r#"/configure system security user "{user}" console member "{profile}""#
            )),
            ConfigLine::plain(format!(
                r#"/configure system security user "{user}" console member "administrative""#
            )),
            ConfigLine::plain(
                "/configure system management-interface yang-modules nokia-modules".into(),
            ),
            ConfigLine::plain(
                "/configure system management-interface yang-modules no base-r13-modules".into(),
            ),
            ConfigLine::plain("/configure system netconf auto-config-save".into()),
            ConfigLine::plain("/configure system netconf no shutdown".into()),
            ConfigLine::plain("/configure system management-interface cli no cli-engine".into()),
            ConfigLine::plain(
                "/configure system management-interface cli md-cli auto-config-save".into(),
            ),
            ConfigLine::plain(
                "/configure system management-interface configuration-mode model-driven".into(),
            ),
        ];

        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[ConfigLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn quotable(field: &'static str, value: &str) -> Result<(), CoreError> {
    if value.chars().any(|c| c == '"' || c == '\\' || c.is_control()) {
        return Err(CoreError::InvalidDevice {
            field,
            reason: "must not contain double quotes, backslashes or control characters".into(),
        });
    }
    Ok(())
}

/// Outcome of sending a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutput {
    /// Output of every accepted line, in order.
    pub output: String,
    /// Lines the device rejected or timed out on.
    pub rejected: usize,
}

/// Send every line of `batch` in order over `session`.
///
/// Individual failures are logged and skipped; the whole batch is always
/// attempted.
pub fn apply<S: InteractiveSession + ?Sized>(session: &mut S, batch: &CommandBatch) -> ApplyOutput {
    let mut result = ApplyOutput::default();

    for (index, line) in batch.lines().iter().enumerate() {
        match session.send_command(line.expose()) {
            Ok(output) => {
                if !output.is_empty() {
                    result.output.push_str(&output);
                    result.output.push('\n');
                }
            }
            Err(e) => {
                result.rejected += 1;
                warn!(line = index + 1, command = %line, error = %e, "configuration line failed, continuing");
            }
        }
    }

    info!(
        sent = batch.len(),
        rejected = result.rejected,
        "enable batch applied"
    );
    result
}
