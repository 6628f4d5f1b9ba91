//! A non-production `ReconcilerPort` that immediately reports every dirty
//! rule as successfully realized. Stands in for the external controller
//! that would actually push datapath state and report back once it lands.

use std::sync::Arc;

use netpol_fqdn_application::services::RuleSyncTracker;
use netpol_fqdn_application::ports::ReconcilerPort;
use netpol_fqdn_domain::RuleId;
use tracing::debug;

pub struct AutoAckReconciler {
    tracker: Arc<RuleSyncTracker>,
}

impl AutoAckReconciler {
    pub fn new(tracker: Arc<RuleSyncTracker>) -> Self {
        Self { tracker }
    }
}

impl ReconcilerPort for AutoAckReconciler {
    fn mark_rule_dirty(&self, rule: RuleId) {
        let tracker = self.tracker.clone();
        tokio::spawn(async move {
            debug!(%rule, "auto-acking rule realization");
            tracker.notify_rule_realization(rule, Ok(())).await;
        });
    }
}
