use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// A single resolved address with the absolute instant it expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpEntry {
    pub ip: IpAddr,
    pub expires_at: DateTime<Utc>,
}

impl IpEntry {
    pub fn new(ip: IpAddr, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            ip,
            expires_at: now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero()),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
