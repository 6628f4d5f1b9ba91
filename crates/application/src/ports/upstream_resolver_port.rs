use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use netpol_fqdn_domain::{DomainError, RecordFamilies};

/// Issues A/AAAA queries for a single name, either directly to a configured
/// server or via the host resolver, and returns the raw `(ip, ttl)` pairs
/// before `minTTL` is applied.
#[async_trait]
pub trait UpstreamResolver: Send + Sync {
    async fn query(
        &self,
        fqdn: &str,
        families: RecordFamilies,
    ) -> Result<Vec<(IpAddr, Duration)>, DomainError>;
}
