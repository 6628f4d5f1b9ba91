use std::sync::Arc;

use netpol_fqdn_domain::{DomainError, RuleId};

use super::state::FqdnEnforcementState;

pub struct DeleteFqdnRuleUseCase {
    state: Arc<FqdnEnforcementState>,
}

impl DeleteFqdnRuleUseCase {
    pub fn new(state: Arc<FqdnEnforcementState>) -> Self {
        Self { state }
    }

    pub async fn execute(&self, rule: RuleId, fqdns: Vec<String>) -> Result<(), DomainError> {
        self.state.selector_cache.remove_rule(&rule, &fqdns)?;

        let delta = self.state.rule_ports.preview_remove(&rule);
        if !delta.removed.is_empty() {
            self.state
                .datapath
                .remove_ports_from_interception(&rule, &delta.removed)
                .await?;
        }
        self.state.rule_ports.commit_remove(&rule);

        Ok(())
    }
}
