use std::sync::Arc;
use std::time::Duration;

use netpol_fqdn_domain::{DomainError, PortId, RuleId};
use tracing::info;

use super::state::FqdnEnforcementState;

pub struct AddFqdnRuleUseCase {
    state: Arc<FqdnEnforcementState>,
}

impl AddFqdnRuleUseCase {
    pub fn new(state: Arc<FqdnEnforcementState>) -> Self {
        Self { state }
    }

    pub async fn execute(
        &self,
        rule: RuleId,
        fqdns: Vec<String>,
        ports: Vec<PortId>,
    ) -> Result<(), DomainError> {
        self.state.datapath.install_dns_interception_flow(&rule).await?;

        let to_query = self.state.selector_cache.add_rule(rule.clone(), &fqdns)?;

        let delta = self.state.rule_ports.preview_update(&rule, &ports);
        if !delta.added.is_empty() {
            self.state
                .datapath
                .add_ports_to_interception(&rule, &delta.added)
                .await?;
        }
        if !delta.removed.is_empty() {
            self.state
                .datapath
                .remove_ports_from_interception(&rule, &delta.removed)
                .await?;
        }
        self.state.rule_ports.commit_update(rule.clone(), ports);

        for name in to_query {
            info!(rule = %rule, fqdn = %name, "scheduling proactive resolution for new exact-name selector");
            self.state.requeue.schedule(name, Duration::ZERO);
        }

        Ok(())
    }
}
