use std::fmt;
use std::str::FromStr;

/// Vendor handler for a NETCONF session.
///
/// Determines extra client capabilities and the subtree filter used to
/// scope `<get-config>` to the vendor configuration tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeviceProfile {
    /// Nokia SR OS (model-driven, `nokia-conf` YANG tree).
    #[default]
    Nokia,
    /// Any RFC 6241 server; no vendor filter.
    Generic,
}

impl DeviceProfile {
    pub fn name(self) -> &'static str {
        match self {
            Self::Nokia => "nokia",
            Self::Generic => "generic",
        }
    }

    /// Namespace of the vendor configuration root, if any.
    pub fn config_namespace(self) -> Option<&'static str> {
        match self {
            Self::Nokia => Some("urn:nokia.com:sros:ns:yang:sr:conf"),
            Self::Generic => None,
        }
    }

    /// Subtree filter selecting the whole vendor configuration tree.
    pub fn running_config_filter(self) -> Option<String> {
        self.config_namespace()
            .map(|ns| format!(r#"<configure xmlns="{ns}"/>"#))
    }

    pub(crate) fn extra_capabilities(self) -> &'static [&'static str] {
        match self {
            Self::Nokia => &["urn:ietf:params:netconf:capability:candidate:1.0"],
            Self::Generic => &[],
        }
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nokia" | "sros" | "alu" => Ok(Self::Nokia),
            "generic" | "default" => Ok(Self::Generic),
            other => Err(format!(
                "unknown device profile '{other}' (expected 'nokia' or 'generic')"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vendor_aliases() {
        assert_eq!("alu".parse::<DeviceProfile>(), Ok(DeviceProfile::Nokia));
        assert_eq!("SROS".parse::<DeviceProfile>(), Ok(DeviceProfile::Nokia));
        assert_eq!("generic".parse::<DeviceProfile>(), Ok(DeviceProfile::Generic));
        assert!("juniper".parse::<DeviceProfile>().is_err());
    }

    #[test]
    fn nokia_filter_targets_configure_root() {
        assert_eq!(
            DeviceProfile::Nokia.running_config_filter().as_deref(),
            Some(r#"<configure xmlns="urn:nokia.com:sros:ns:yang:sr:conf"/>"#)
        );
        assert_eq!(DeviceProfile::Generic.running_config_filter(), None);
    }
}
