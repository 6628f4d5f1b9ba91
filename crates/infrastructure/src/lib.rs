pub mod demo;
pub mod dns;

pub use demo::{AutoAckReconciler, LoggingDatapath};
pub use dns::{DatapathPacketParser, DirectUpstreamResolver, HostUpstreamResolver};
