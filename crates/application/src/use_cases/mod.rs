mod add_fqdn_rule;
mod controller;
mod delete_fqdn_rule;
mod get_ips_for_selectors;
mod handle_intercepted_packet;
mod notify_rule_realization;
mod state;

pub use add_fqdn_rule::AddFqdnRuleUseCase;
pub use controller::FqdnPolicyController;
pub use delete_fqdn_rule::DeleteFqdnRuleUseCase;
pub use get_ips_for_selectors::GetIpsForSelectorsUseCase;
pub use handle_intercepted_packet::HandleInterceptedPacketUseCase;
pub use notify_rule_realization::NotifyRuleRealizationUseCase;
pub use state::FqdnEnforcementState;
