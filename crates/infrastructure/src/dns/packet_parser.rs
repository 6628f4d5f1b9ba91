//! Decodes a paused packet's raw L2 frame into a DNS response.
//!
//! Handles Ethernet framing over IPv4/IPv6, and UDP or length-prefixed TCP
//! transport, mirroring what a real datapath would hand a userspace
//! interception hook. Anything that isn't recognizable as a DNS response on
//! port 53 is reported as `NotDns` and released unchanged by the caller.

use std::net::IpAddr;
use std::time::Duration;

use hickory_proto::op::Message;
use hickory_proto::rr::RData;
use netpol_fqdn_domain::RecordFamilies;
use netpol_fqdn_application::ports::{DnsPacketParser, ParsedPacket};
use pnet_packet::ethernet::{EtherTypes, EthernetPacket};
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::Ipv4Packet;
use pnet_packet::ipv6::Ipv6Packet;
use pnet_packet::tcp::TcpPacket;
use pnet_packet::udp::UdpPacket;
use pnet_packet::Packet;
use tracing::debug;

const DNS_PORT: u16 = 53;

#[derive(Debug, Default)]
pub struct DatapathPacketParser;

impl DatapathPacketParser {
    pub fn new() -> Self {
        Self
    }

    fn transport_payload(raw_frame: &[u8]) -> Option<(u16, u16, Vec<u8>)> {
        let ethernet = EthernetPacket::new(raw_frame)?;
        match ethernet.get_ethertype() {
            EtherTypes::Ipv4 => {
                let ip = Ipv4Packet::new(ethernet.payload())?;
                Self::udp_or_tcp_payload(ip.get_next_level_protocol(), ip.payload())
            }
            EtherTypes::Ipv6 => {
                let ip = Ipv6Packet::new(ethernet.payload())?;
                Self::udp_or_tcp_payload(ip.get_next_header(), ip.payload())
            }
            _ => None,
        }
    }

    fn udp_or_tcp_payload(
        proto: pnet_packet::ip::IpNextHeaderProtocol,
        payload: &[u8],
    ) -> Option<(u16, u16, Vec<u8>)> {
        match proto {
            IpNextHeaderProtocols::Udp => {
                let udp = UdpPacket::new(payload)?;
                Some((udp.get_source(), udp.get_destination(), udp.payload().to_vec()))
            }
            IpNextHeaderProtocols::Tcp => {
                let tcp = TcpPacket::new(payload)?;
                Some((tcp.get_source(), tcp.get_destination(), tcp.payload().to_vec()))
            }
            _ => None,
        }
    }

    /// A length-prefixed TCP DNS message may have arrived split across
    /// packet boundaries. Returns the declared-length slice and `true` when
    /// all of it is present; otherwise returns whatever bytes did arrive
    /// and `false`, so the caller can attempt a partial decode rather than
    /// discarding the fragment outright.
    fn tcp_message_bytes(payload: &[u8]) -> Option<(&[u8], bool)> {
        if payload.len() < 2 {
            return None;
        }
        let declared = u16::from_be_bytes([payload[0], payload[1]]) as usize;
        let body = &payload[2..];
        if body.len() >= declared {
            Some((&body[..declared], true))
        } else {
            Some((body, false))
        }
    }

    /// Recovers a message from a first TCP fragment that was cut off
    /// before the declared length was reached. Drops the authority and
    /// additional sections (never read by this parser) and then walks the
    /// answer count down from its declared value until the header's
    /// bookkeeping matches the answers actually present in `available`.
    fn decode_partial(available: &[u8]) -> Option<Message> {
        if available.len() < 12 {
            return None;
        }
        let mut buf = available.to_vec();
        buf[8..10].copy_from_slice(&0u16.to_be_bytes());
        buf[10..12].copy_from_slice(&0u16.to_be_bytes());

        let declared_answers = u16::from_be_bytes([buf[6], buf[7]]);
        for answers in (0..=declared_answers).rev() {
            buf[6..8].copy_from_slice(&answers.to_be_bytes());
            if let Ok(message) = Message::from_vec(&buf) {
                return Some(message);
            }
        }
        None
    }
}

impl DnsPacketParser for DatapathPacketParser {
    fn parse(&self, raw_frame: &[u8], min_ttl: Duration, families: RecordFamilies) -> ParsedPacket {
        let Some((src_port, dst_port, payload)) = Self::transport_payload(raw_frame) else {
            return ParsedPacket::NotDns;
        };

        if src_port != DNS_PORT && dst_port != DNS_PORT {
            return ParsedPacket::NotDns;
        }

        let is_udp = payload.len() >= 12 && Message::from_vec(&payload).is_ok();
        let message = if is_udp {
            match Message::from_vec(&payload) {
                Ok(m) => m,
                Err(e) => {
                    debug!(error = %e, "not a decodable dns message");
                    return ParsedPacket::NotDns;
                }
            }
        } else {
            let Some((body, complete)) = Self::tcp_message_bytes(&payload) else {
                return ParsedPacket::NotDns;
            };
            if complete {
                match Message::from_vec(body) {
                    Ok(m) => m,
                    Err(e) => {
                        debug!(error = %e, "not a decodable dns message");
                        return ParsedPacket::NotDns;
                    }
                }
            } else {
                match Self::decode_partial(body) {
                    Some(m) => m,
                    None => {
                        debug!("truncated tcp dns fragment could not be partially decoded");
                        return ParsedPacket::NotDns;
                    }
                }
            }
        };

        if message.queries.is_empty() {
            return ParsedPacket::NotDns;
        }

        let fqdn = message.queries[0].name().to_utf8();
        let min_ttl_secs = min_ttl.as_secs() as u32;

        let mut answers = Vec::new();
        for record in &message.answers {
            let ip = match record.data() {
                RData::A(a) if families.v4 => IpAddr::V4(a.0),
                RData::AAAA(aaaa) if families.v6 => IpAddr::V6(aaaa.0),
                _ => continue,
            };
            let ttl = Duration::from_secs(record.ttl().max(min_ttl_secs) as u64);
            answers.push((ip, ttl));
        }

        ParsedPacket::DnsResponse { fqdn, answers }
    }
}
