// NETCONF state detection from CLI probe output.

/// Read-only command whose output reveals the NETCONF service state.
pub const PROBE_COMMAND: &str = "show system netconf | match State";

/// Full status listing, used to confirm the service after enabling it.
pub const VERIFY_COMMAND: &str = "show system netconf";

/// Substring whose presence in probe output means the service is up.
pub const ENABLED_MARKER: &str = "Enabled";

/// Whether probe output reports NETCONF as enabled.
///
/// Case-sensitive: SR OS prints `Enabled`, and lowercase occurrences
/// elsewhere in the output must not match.
pub fn is_enabled(probe_output: &str) -> bool {
    probe_output.contains(ENABLED_MARKER)
}
