use std::sync::Arc;

use netpol_fqdn_domain::{DomainError, RuleId};

use super::state::FqdnEnforcementState;

pub struct NotifyRuleRealizationUseCase {
    state: Arc<FqdnEnforcementState>,
}

impl NotifyRuleRealizationUseCase {
    pub fn new(state: Arc<FqdnEnforcementState>) -> Self {
        Self { state }
    }

    pub async fn execute(&self, rule: RuleId, result: Result<(), DomainError>) {
        let mapped = result.map_err(|e| e.to_string());
        self.state.tracker.notify_rule_realization(rule, mapped).await;
    }
}
