use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use netpol_fqdn_application::ports::{DatapathPort, DnsPacketParser, ParsedPacket, ReconcilerPort, Requeue};
use netpol_fqdn_application::services::RuleSyncTracker;
use netpol_fqdn_domain::{DomainError, PacketHandle, PortId, RecordFamilies, RuleId};

#[derive(Default)]
pub struct RecordingDatapath {
    pub resumed: Mutex<Vec<u64>>,
}

#[async_trait]
impl DatapathPort for RecordingDatapath {
    async fn install_dns_interception_flow(&self, _rule: &RuleId) -> Result<(), DomainError> {
        Ok(())
    }

    async fn add_ports_to_interception(&self, _rule: &RuleId, _ports: &[PortId]) -> Result<(), DomainError> {
        Ok(())
    }

    async fn remove_ports_from_interception(&self, _rule: &RuleId, _ports: &[PortId]) -> Result<(), DomainError> {
        Ok(())
    }

    async fn resume_paused_packet(&self, packet: PacketHandle) -> Result<(), DomainError> {
        self.resumed.lock().unwrap().push(packet.cookie);
        Ok(())
    }
}

/// Reconciler whose verdict for every dirty rule is fixed for the lifetime
/// of the test, standing in for the real CNI agent reconcile loop.
pub struct ScriptedReconciler {
    pub tracker: Arc<RuleSyncTracker>,
    pub outcome: Result<(), String>,
}

impl ReconcilerPort for ScriptedReconciler {
    fn mark_rule_dirty(&self, rule: RuleId) {
        let outcome = self.outcome.clone();
        let tracker = self.tracker.clone();
        tokio::spawn(async move {
            tracker.notify_rule_realization(rule, outcome).await;
        });
    }
}

#[derive(Default)]
pub struct RecordingRequeue {
    pub scheduled: Mutex<Vec<(String, Duration)>>,
}

impl Requeue for RecordingRequeue {
    fn schedule(&self, fqdn: String, delay: Duration) {
        self.scheduled.lock().unwrap().push((fqdn, delay));
    }
}

/// Replays a pre-loaded sequence of DNS answers, one per `parse` call,
/// standing in for the wire-format parser that lives outside this layer.
#[derive(Default)]
pub struct SequencedResponseParser {
    responses: Mutex<VecDeque<(String, Vec<(IpAddr, Duration)>)>>,
}

impl SequencedResponseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, fqdn: &str, answers: Vec<(IpAddr, Duration)>) {
        self.responses.lock().unwrap().push_back((fqdn.to_string(), answers));
    }
}

impl DnsPacketParser for SequencedResponseParser {
    fn parse(&self, _raw_frame: &[u8], _min_ttl: Duration, _families: RecordFamilies) -> ParsedPacket {
        match self.responses.lock().unwrap().pop_front() {
            Some((fqdn, answers)) => ParsedPacket::DnsResponse { fqdn, answers },
            None => ParsedPacket::NotDns,
        }
    }
}
