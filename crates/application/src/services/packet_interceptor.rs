use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use netpol_fqdn_domain::{DomainError, PacketHandle, RecordFamilies, RuleId};
use tracing::{debug, warn};

use crate::ports::{DatapathPort, DnsPacketParser, ParsedPacket, ReconcilerPort, Requeue};
use crate::services::rule_sync_tracker::RuleSyncTracker;
use crate::services::selector_cache::SelectorCache;

/// Consumes paused DNS-response packets from the datapath, merges their
/// answers into the cache, waits for the rules they affect to be realized,
/// and finally resumes or drops the packet. This is the central safety
/// barrier: a DNS response never reaches the workload before the datapath
/// rules governing its contents are realized.
pub struct PacketInterceptor {
    selector_cache: Arc<SelectorCache>,
    tracker: Arc<RuleSyncTracker>,
    datapath: Arc<dyn DatapathPort>,
    reconciler: Arc<dyn ReconcilerPort>,
    parser: Arc<dyn DnsPacketParser>,
    requeue: Arc<dyn Requeue>,
    min_ttl: Duration,
    families: RecordFamilies,
    realization_timeout: Duration,
}

impl PacketInterceptor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        selector_cache: Arc<SelectorCache>,
        tracker: Arc<RuleSyncTracker>,
        datapath: Arc<dyn DatapathPort>,
        reconciler: Arc<dyn ReconcilerPort>,
        parser: Arc<dyn DnsPacketParser>,
        requeue: Arc<dyn Requeue>,
        min_ttl: Duration,
        families: RecordFamilies,
        realization_timeout: Duration,
    ) -> Self {
        Self {
            selector_cache,
            tracker,
            datapath,
            reconciler,
            parser,
            requeue,
            min_ttl,
            families,
            realization_timeout,
        }
    }

    pub async fn handle_intercepted_packet(&self, packet: PacketHandle) -> Result<(), DomainError> {
        let parsed = self.parser.parse(&packet.raw_frame, self.min_ttl, self.families);

        let (fqdn, answers) = match parsed {
            ParsedPacket::NotDns => return self.datapath.resume_paused_packet(packet).await,
            ParsedPacket::DnsResponse { fqdn, answers } => (fqdn, answers),
        };

        let now = Utc::now();
        let outcome = match self.selector_cache.merge_response(now, &fqdn, &answers) {
            Some(outcome) => outcome,
            None => {
                debug!(%fqdn, "no selector matches this name, dropping response from cache");
                return self.datapath.resume_paused_packet(packet).await;
            }
        };

        if let Some(delay) = outcome.next_requery {
            self.requeue.schedule(fqdn.clone(), delay);
        }

        let affected_rules = self.selector_cache.matching_rules_for_fqdn(&fqdn);

        let rules_to_await: Vec<RuleId> = if outcome.address_update {
            affected_rules.into_iter().collect()
        } else {
            let dirty = self.tracker.snapshot_dirty();
            affected_rules.into_iter().filter(|r| dirty.contains(r)).collect()
        };

        if rules_to_await.is_empty() {
            return self.datapath.resume_paused_packet(packet).await;
        }

        let wait = self.tracker.subscribe(&rules_to_await);
        for rule in &rules_to_await {
            self.reconciler.mark_rule_dirty(rule.clone());
        }

        match tokio::time::timeout(self.realization_timeout, wait).await {
            Ok(Ok(Ok(()))) => self.datapath.resume_paused_packet(packet).await,
            Ok(Ok(Err(e))) => {
                warn!(%fqdn, error = %e, "rule realization failed, dropping paused packet");
                Err(DomainError::RealizationFailed(fqdn, e))
            }
            Ok(Err(_)) => {
                warn!(%fqdn, "rule sync tracker dropped the subscriber, dropping paused packet");
                Err(DomainError::RealizationFailed(
                    fqdn,
                    "subscriber channel closed".to_string(),
                ))
            }
            Err(_) => {
                warn!(%fqdn, timeout_ms = self.realization_timeout.as_millis() as u64, "rule realization timed out, dropping paused packet");
                Err(DomainError::RealizationTimeout(fqdn))
            }
        }
    }
}
