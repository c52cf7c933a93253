// Device identity extraction from a `<get-config>` reply.
//
// The identity is the text of `rpc-reply/data/configure/system/name`.
// Elements are matched by local name so the NETCONF base namespace and the
// vendor configuration namespace are both accepted without prefixes.

use roxmltree::Node;

use crate::error::CoreError;

/// Element path from the document root to the system name.
pub const IDENTITY_PATH: [&str; 5] = ["rpc-reply", "data", "configure", "system", "name"];

/// Return the trimmed system name, or a parse error naming the first
/// missing element.
pub fn extract(raw: &str) -> Result<String, CoreError> {
    let doc = roxmltree::Document::parse(raw.trim_start())
        .map_err(|e| CoreError::parse(format!("malformed configuration document: {e}")))?;

    let root = doc.root_element();
    if root.tag_name().name() != IDENTITY_PATH[0] {
        return Err(CoreError::parse(format!(
            "expected <{}> root, found <{}>",
            IDENTITY_PATH[0],
            root.tag_name().name()
        )));
    }

    let mut node = root;
    for (depth, segment) in IDENTITY_PATH.iter().enumerate().skip(1) {
        node = child_element(node, segment).ok_or_else(|| {
            CoreError::parse(format!(
                "missing <{segment}> under {}",
                IDENTITY_PATH[..depth].join("/")
            ))
        })?;
    }

    let name = node.text().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(CoreError::parse("system name is empty"));
    }
    Ok(name.to_owned())
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}
