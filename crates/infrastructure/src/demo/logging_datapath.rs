//! A non-production `DatapathPort` that logs every call it receives and
//! always succeeds. Stands in for the real eBPF/iptables/OVS flow
//! programming a cluster CNI datapath would perform.

use async_trait::async_trait;
use netpol_fqdn_application::ports::DatapathPort;
use netpol_fqdn_domain::{DomainError, PacketHandle, PortId, RuleId};
use tracing::info;

#[derive(Debug, Default)]
pub struct LoggingDatapath;

impl LoggingDatapath {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatapathPort for LoggingDatapath {
    async fn install_dns_interception_flow(&self, rule: &RuleId) -> Result<(), DomainError> {
        info!(%rule, "installing dns interception flow");
        Ok(())
    }

    async fn add_ports_to_interception(
        &self,
        rule: &RuleId,
        ports: &[PortId],
    ) -> Result<(), DomainError> {
        info!(%rule, ports = ?ports, "adding ports to interception");
        Ok(())
    }

    async fn remove_ports_from_interception(
        &self,
        rule: &RuleId,
        ports: &[PortId],
    ) -> Result<(), DomainError> {
        info!(%rule, ports = ?ports, "removing ports from interception");
        Ok(())
    }

    async fn resume_paused_packet(&self, packet: PacketHandle) -> Result<(), DomainError> {
        info!(cookie = packet.cookie, "resuming paused packet");
        Ok(())
    }
}
