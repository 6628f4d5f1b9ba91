//! Issues A/AAAA queries for a single name.
//!
//! When an upstream server is configured, queries it directly over UDP in
//! wire format, the same way a stub resolver talks to its recursive
//! forwarder. Otherwise falls back to the host's own resolver (e.g. the
//! cluster's default `/etc/resolv.conf` chain), synthesizing a conservative
//! TTL since `hickory-resolver`'s lookup API doesn't expose per-record TTLs
//! uniformly across platforms.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RData, RecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinEncodable, BinEncoder};
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::net::runtime::TokioRuntimeProvider;
use hickory_resolver::Resolver;
use netpol_fqdn_application::ports::UpstreamResolver;
use netpol_fqdn_domain::{DomainError, RecordFamilies};
use tokio::net::UdpSocket;
use tracing::debug;

const MAX_UDP_RESPONSE_SIZE: usize = 4096;
const HOST_RESOLVER_FALLBACK_TTL_SECS: u64 = 600;

fn new_query_message(name: Name, record_type: RecordType) -> Vec<u8> {
    let mut query = Query::new();
    query.set_name(name);
    query.set_query_type(record_type);
    query.set_query_class(hickory_proto::rr::DNSClass::IN);

    let mut message = Message::new(fastrand::u16(..), MessageType::Query, OpCode::Query);
    message.metadata.recursion_desired = true;
    message.add_query(query);

    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    message.emit(&mut encoder).expect("in-memory dns message encoding cannot fail");
    buf
}

async fn query_server_for_type(
    server: SocketAddr,
    timeout: Duration,
    name: &Name,
    record_type: RecordType,
) -> Result<Vec<(IpAddr, Duration)>, DomainError> {
    let query_bytes = new_query_message(name.clone(), record_type);

    let bind_addr: SocketAddr = if server.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" }
        .parse()
        .expect("static bind address is valid");
    let socket = UdpSocket::bind(bind_addr)
        .await
        .map_err(|e| DomainError::QueryFailed(name.to_utf8(), e.to_string()))?;

    tokio::time::timeout(timeout, socket.send_to(&query_bytes, server))
        .await
        .map_err(|_| DomainError::QueryTimeout(name.to_utf8()))?
        .map_err(|e| DomainError::QueryFailed(name.to_utf8(), e.to_string()))?;

    let mut buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
    let received = tokio::time::timeout(timeout, socket.recv(&mut buf))
        .await
        .map_err(|_| DomainError::QueryTimeout(name.to_utf8()))?
        .map_err(|e| DomainError::QueryFailed(name.to_utf8(), e.to_string()))?;
    buf.truncate(received);

    let message = Message::from_bytes(&buf)
        .map_err(|e| DomainError::InvalidDnsResponse(e.to_string()))?;

    let mut answers = Vec::new();
    for record in &message.answers {
        match &record.data {
            RData::A(a) => answers.push((IpAddr::V4(a.0), Duration::from_secs(record.ttl as u64))),
            RData::AAAA(aaaa) => {
                answers.push((IpAddr::V6(aaaa.0), Duration::from_secs(record.ttl as u64)))
            }
            _ => {}
        }
    }
    Ok(answers)
}

/// Queries a directly-configured upstream server over UDP, in wire format.
pub struct DirectUpstreamResolver {
    server: SocketAddr,
    timeout: Duration,
}

impl DirectUpstreamResolver {
    pub fn new(server: SocketAddr, timeout: Duration) -> Self {
        Self { server, timeout }
    }
}

#[async_trait]
impl UpstreamResolver for DirectUpstreamResolver {
    async fn query(
        &self,
        fqdn: &str,
        families: RecordFamilies,
    ) -> Result<Vec<(IpAddr, Duration)>, DomainError> {
        let name = Name::from_str(fqdn)
            .map_err(|e| DomainError::InvalidFqdn(format!("{fqdn}: {e}")))?;

        let mut answers = Vec::new();
        if families.v4 {
            answers.extend(query_server_for_type(self.server, self.timeout, &name, RecordType::A).await?);
        }
        if families.v6 {
            answers
                .extend(query_server_for_type(self.server, self.timeout, &name, RecordType::AAAA).await?);
        }
        debug!(fqdn, server = %self.server, answers = answers.len(), "direct upstream query completed");
        Ok(answers)
    }
}

/// Falls back to the host's resolver chain when no upstream server is
/// configured for the cluster.
pub struct HostUpstreamResolver {
    resolver: Resolver<TokioRuntimeProvider>,
}

impl HostUpstreamResolver {
    pub fn new() -> Self {
        let resolver = Resolver::builder_with_config(
            ResolverConfig::default(),
            TokioRuntimeProvider::default(),
        )
        .build()
        .expect("default tokio resolver configuration is always valid");
        Self { resolver }
    }
}

impl Default for HostUpstreamResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UpstreamResolver for HostUpstreamResolver {
    async fn query(
        &self,
        fqdn: &str,
        families: RecordFamilies,
    ) -> Result<Vec<(IpAddr, Duration)>, DomainError> {
        let ttl = Duration::from_secs(HOST_RESOLVER_FALLBACK_TTL_SECS);
        let mut answers = Vec::new();

        if families.v4 {
            match self.resolver.ipv4_lookup(fqdn).await {
                Ok(response) => {
                    answers.extend(response.iter().map(|a| (IpAddr::V4(a.0), ttl)));
                }
                Err(e) => return Err(DomainError::QueryFailed(fqdn.to_string(), e.to_string())),
            }
        }
        if families.v6 {
            match self.resolver.ipv6_lookup(fqdn).await {
                Ok(response) => {
                    answers.extend(response.iter().map(|a| (IpAddr::V6(a.0), ttl)));
                }
                Err(e) => return Err(DomainError::QueryFailed(fqdn.to_string(), e.to_string())),
            }
        }

        debug!(fqdn, answers = answers.len(), "host resolver fallback query completed");
        Ok(answers)
    }
}
