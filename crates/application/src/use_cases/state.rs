use std::sync::Arc;

use crate::ports::{DatapathPort, Requeue};
use crate::services::{PacketInterceptor, RulePortIndex, RuleSyncTracker, SelectorCache};

/// Shared core state every use case operates against. Construction lives in
/// the CLI composition root; use cases only ever see this bundle.
pub struct FqdnEnforcementState {
    pub selector_cache: Arc<SelectorCache>,
    pub rule_ports: Arc<RulePortIndex>,
    pub tracker: Arc<RuleSyncTracker>,
    pub datapath: Arc<dyn DatapathPort>,
    pub interceptor: Arc<PacketInterceptor>,
    pub requeue: Arc<dyn Requeue>,
}
