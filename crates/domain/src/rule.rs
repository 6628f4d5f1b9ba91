use std::fmt;
use std::sync::Arc;

/// Opaque, stable identifier for a NetworkPolicy-derived FQDN rule. Cheap to
/// clone into subscriber lists and dirty-rule sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(Arc<str>);

impl RuleId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RuleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RuleId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Local workload port number the datapath's DNS-interception flow matches
/// on for a given rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(pub u32);

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which address families the agent resolves and intercepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFamilies {
    pub v4: bool,
    pub v6: bool,
}

impl Default for RecordFamilies {
    fn default() -> Self {
        Self { v4: true, v6: true }
    }
}

/// Opaque handle for a paused DNS-response packet, round-tripped unchanged
/// to `ResumePausedPacket`.
#[derive(Debug, Clone)]
pub struct PacketHandle {
    pub raw_frame: Arc<[u8]>,
    pub cookie: u64,
}

impl PacketHandle {
    pub fn new(raw_frame: impl Into<Arc<[u8]>>, cookie: u64) -> Self {
        Self {
            raw_frame: raw_frame.into(),
            cookie,
        }
    }
}
