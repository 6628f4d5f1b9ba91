mod datapath_port;
mod packet_parser_port;
mod reconciler_port;
mod requeue_port;
mod upstream_resolver_port;

pub use datapath_port::DatapathPort;
pub use packet_parser_port::{DnsPacketParser, ParsedPacket};
pub use reconciler_port::ReconcilerPort;
pub use requeue_port::Requeue;
pub use upstream_resolver_port::UpstreamResolver;
