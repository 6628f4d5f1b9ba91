use std::net::IpAddr;
use std::sync::Arc;

use netpol_fqdn_domain::{DomainError, PacketHandle, PortId, RuleId};

use super::add_fqdn_rule::AddFqdnRuleUseCase;
use super::delete_fqdn_rule::DeleteFqdnRuleUseCase;
use super::get_ips_for_selectors::GetIpsForSelectorsUseCase;
use super::handle_intercepted_packet::HandleInterceptedPacketUseCase;
use super::notify_rule_realization::NotifyRuleRealizationUseCase;
use super::state::FqdnEnforcementState;

/// The facade exposed to the policy controller: the five operations of
/// `spec.md` §6, each delegating to its own use case over shared state.
pub struct FqdnPolicyController {
    add_fqdn_rule: AddFqdnRuleUseCase,
    delete_fqdn_rule: DeleteFqdnRuleUseCase,
    get_ips_for_selectors: GetIpsForSelectorsUseCase,
    notify_rule_realization: NotifyRuleRealizationUseCase,
    handle_intercepted_packet: HandleInterceptedPacketUseCase,
}

impl FqdnPolicyController {
    pub fn new(state: Arc<FqdnEnforcementState>) -> Self {
        Self {
            add_fqdn_rule: AddFqdnRuleUseCase::new(state.clone()),
            delete_fqdn_rule: DeleteFqdnRuleUseCase::new(state.clone()),
            get_ips_for_selectors: GetIpsForSelectorsUseCase::new(state.clone()),
            notify_rule_realization: NotifyRuleRealizationUseCase::new(state.clone()),
            handle_intercepted_packet: HandleInterceptedPacketUseCase::new(state),
        }
    }

    pub async fn add_fqdn_rule(
        &self,
        rule: RuleId,
        fqdns: Vec<String>,
        ports: Vec<PortId>,
    ) -> Result<(), DomainError> {
        self.add_fqdn_rule.execute(rule, fqdns, ports).await
    }

    pub async fn delete_fqdn_rule(&self, rule: RuleId, fqdns: Vec<String>) -> Result<(), DomainError> {
        self.delete_fqdn_rule.execute(rule, fqdns).await
    }

    pub fn get_ips_for_selectors(&self, fqdns: Vec<String>) -> Result<Vec<IpAddr>, DomainError> {
        self.get_ips_for_selectors.execute(fqdns)
    }

    pub async fn notify_rule_realization(&self, rule: RuleId, result: Result<(), DomainError>) {
        self.notify_rule_realization.execute(rule, result).await
    }

    pub async fn handle_intercepted_packet(&self, packet: PacketHandle) -> Result<(), DomainError> {
        self.handle_intercepted_packet.execute(packet).await
    }
}
