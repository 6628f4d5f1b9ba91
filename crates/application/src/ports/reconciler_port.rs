use netpol_fqdn_domain::RuleId;

/// Fire-and-forget notification to the external rule reconciler. The
/// reconciler eventually reports back through `NotifyRuleRealization`.
pub trait ReconcilerPort: Send + Sync {
    fn mark_rule_dirty(&self, rule: RuleId);
}
