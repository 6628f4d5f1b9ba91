use async_trait::async_trait;
use netpol_fqdn_domain::{DomainError, PacketHandle, PortId, RuleId};

/// Narrow interface onto the datapath: installing the DNS-interception flow,
/// keeping its matched-port set in sync with rule membership, and resuming
/// packets this core decided to release.
#[async_trait]
pub trait DatapathPort: Send + Sync {
    async fn install_dns_interception_flow(&self, rule: &RuleId) -> Result<(), DomainError>;

    async fn add_ports_to_interception(
        &self,
        rule: &RuleId,
        ports: &[PortId],
    ) -> Result<(), DomainError>;

    async fn remove_ports_from_interception(
        &self,
        rule: &RuleId,
        ports: &[PortId],
    ) -> Result<(), DomainError>;

    async fn resume_paused_packet(&self, packet: PacketHandle) -> Result<(), DomainError>;
}
