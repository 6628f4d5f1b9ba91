use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use netpol_fqdn_application::ports::{DatapathPort, DnsPacketParser, ParsedPacket, ReconcilerPort, Requeue};
use netpol_fqdn_domain::{DomainError, PacketHandle, PortId, RecordFamilies, RuleId};

#[derive(Default)]
pub struct MockDatapath {
    pub resumed: Mutex<Vec<u64>>,
    pub fail_resume: Mutex<bool>,
}

#[async_trait]
impl DatapathPort for MockDatapath {
    async fn install_dns_interception_flow(&self, _rule: &RuleId) -> Result<(), DomainError> {
        Ok(())
    }

    async fn add_ports_to_interception(
        &self,
        _rule: &RuleId,
        _ports: &[PortId],
    ) -> Result<(), DomainError> {
        Ok(())
    }

    async fn remove_ports_from_interception(
        &self,
        _rule: &RuleId,
        _ports: &[PortId],
    ) -> Result<(), DomainError> {
        Ok(())
    }

    async fn resume_paused_packet(&self, packet: PacketHandle) -> Result<(), DomainError> {
        if *self.fail_resume.lock().unwrap() {
            return Err(DomainError::DatapathError("resume failed".to_string()));
        }
        self.resumed.lock().unwrap().push(packet.cookie);
        Ok(())
    }
}

/// Reconciler stand-in whose outcome for the next `mark_rule_dirty` call is
/// pre-programmed by the test.
pub struct ScriptedReconciler {
    pub tracker: Arc<netpol_fqdn_application::services::RuleSyncTracker>,
    pub outcome: Mutex<Result<(), String>>,
}

impl ReconcilerPort for ScriptedReconciler {
    fn mark_rule_dirty(&self, rule: RuleId) {
        let outcome = self.outcome.lock().unwrap().clone();
        let tracker = self.tracker.clone();
        tokio::spawn(async move {
            tracker.notify_rule_realization(rule, outcome).await;
        });
    }
}

#[derive(Default)]
pub struct NoopRequeue {
    pub scheduled: Mutex<Vec<(String, Duration)>>,
}

impl Requeue for NoopRequeue {
    fn schedule(&self, fqdn: String, delay: Duration) {
        self.scheduled.lock().unwrap().push((fqdn, delay));
    }
}

/// Parses nothing from bytes; instead replays a single fixed response,
/// standing in for the real wire-format parser that lives in the
/// infrastructure crate.
pub struct FixedResponseParser {
    pub fqdn: String,
    pub answers: Vec<(IpAddr, Duration)>,
}

impl DnsPacketParser for FixedResponseParser {
    fn parse(&self, _raw_frame: &[u8], _min_ttl: Duration, _families: RecordFamilies) -> ParsedPacket {
        ParsedPacket::DnsResponse {
            fqdn: self.fqdn.clone(),
            answers: self.answers.clone(),
        }
    }
}
