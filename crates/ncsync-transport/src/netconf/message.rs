// NETCONF message construction and reply inspection.

use crate::error::Error;
use crate::netconf::profile::DeviceProfile;

const NETCONF_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

pub const BASE_1_0: &str = "urn:ietf:params:netconf:base:1.0";
pub const BASE_1_1: &str = "urn:ietf:params:netconf:base:1.1";

pub(crate) fn client_hello(profile: DeviceProfile) -> String {
    let capabilities: String = [BASE_1_0, BASE_1_1]
        .iter()
        .chain(profile.extra_capabilities())
        .map(|c| format!("<capability>{c}</capability>"))
        .collect();
    format!(r#"{XML_DECL}<hello xmlns="{NETCONF_NS}"><capabilities>{capabilities}</capabilities></hello>"#)
}

pub(crate) fn get_config(message_id: u64, filter: Option<&str>) -> String {
    let filter = filter
        .map(|f| format!(r#"<filter type="subtree">{f}</filter>"#))
        .unwrap_or_default();
    format!(
        r#"{XML_DECL}<rpc message-id="{message_id}" xmlns="{NETCONF_NS}"><get-config><source><running/></source>{filter}</get-config></rpc>"#
    )
}

pub(crate) fn close_session(message_id: u64) -> String {
    format!(r#"{XML_DECL}<rpc message-id="{message_id}" xmlns="{NETCONF_NS}"><close-session/></rpc>"#)
}

/// What the server announced in its `<hello>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerHello {
    pub capabilities: Vec<String>,
    pub session_id: Option<String>,
}

impl ServerHello {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let doc = roxmltree::Document::parse(raw.trim())
            .map_err(|e| Error::Hello(format!("server hello is not well-formed: {e}")))?;

        let root = doc.root_element();
        if root.tag_name().name() != "hello" {
            return Err(Error::Hello(format!(
                "expected <hello>, got <{}>",
                root.tag_name().name()
            )));
        }

        let hello = Self {
            capabilities: element_texts(root, "capability").collect(),
            session_id: element_texts(root, "session-id").next(),
        };

        if !hello.supports(BASE_1_0) && !hello.supports(BASE_1_1) {
            return Err(Error::Hello("server advertised no NETCONF base capability".into()));
        }
        Ok(hello)
    }

    /// Whether a capability URI was advertised (query parameters ignored).
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.split('?').next() == Some(capability))
    }
}

fn element_texts<'a, 'input: 'a>(
    node: roxmltree::Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = String> + 'a {
    node.descendants()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
        .filter_map(|n| n.text())
        .map(|t| t.trim().to_owned())
}

/// Fail with [`Error::Rpc`] if the reply carries an `<rpc-error>` of
/// severity `error`. Warnings pass through.
///
/// Replies that cannot be parsed are passed through as well; interpreting
/// their content is the caller's job.
pub fn check_reply(reply: &str) -> Result<(), Error> {
    let Ok(doc) = roxmltree::Document::parse(reply.trim()) else {
        return Ok(());
    };

    let error = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "rpc-error")
        .find(|n| child_text(*n, "error-severity").as_deref() != Some("warning"));

    match error {
        Some(node) => Err(Error::Rpc {
            tag: child_text(node, "error-tag").unwrap_or_else(|| "unknown".into()),
            message: child_text(node, "error-message").unwrap_or_default(),
        }),
        None => Ok(()),
    }
}

fn child_text(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
        .and_then(|c| c.text())
        .map(|t| t.trim().to_owned())
}
