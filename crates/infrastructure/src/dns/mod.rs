pub mod packet_parser;
pub mod upstream_resolver;

pub use packet_parser::DatapathPacketParser;
pub use upstream_resolver::{DirectUpstreamResolver, HostUpstreamResolver};
