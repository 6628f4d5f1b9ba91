use std::net::IpAddr;
use std::time::Duration;

use netpol_fqdn_domain::RecordFamilies;

/// Outcome of attempting to classify and decode a paused packet as a DNS
/// response.
pub enum ParsedPacket {
    /// A DNS response whose first question names `fqdn`, with the surviving
    /// A/AAAA answers (already floored at `minTTL`).
    DnsResponse {
        fqdn: String,
        answers: Vec<(IpAddr, Duration)>,
    },
    /// Not a DNS response, or unparseable even as a partial TCP fragment.
    /// Always released unchanged by the caller.
    NotDns,
}

/// Decodes the raw L2 frame of a paused packet into a DNS response, if any.
/// Implementations handle Ethernet/IPv4/IPv6 framing and UDP or
/// length-prefixed TCP demultiplexing.
pub trait DnsPacketParser: Send + Sync {
    fn parse(&self, raw_frame: &[u8], min_ttl: Duration, families: RecordFamilies) -> ParsedPacket;
}
