pub mod packet_interceptor;
pub mod rule_port_index;
pub mod rule_sync_tracker;
pub mod selector_cache;

pub use packet_interceptor::PacketInterceptor;
pub use rule_port_index::{PortDelta, RulePortIndex};
pub use rule_sync_tracker::{RealizationResult, RuleSyncTracker};
pub use selector_cache::SelectorCache;
