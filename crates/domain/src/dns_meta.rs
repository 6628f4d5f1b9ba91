use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::ip_entry::IpEntry;

/// Per-name set of resolved addresses and their expirations. Keyed by IP so
/// that a repeated merge does not need to scan a `Vec`.
#[derive(Debug, Clone, Default)]
pub struct DnsMeta {
    entries: HashMap<IpAddr, IpEntry>,
}

/// Result of folding a freshly-parsed response into an existing `DnsMeta`.
pub struct MergeOutcome {
    /// True if the set of currently-valid IPs changed (addition or
    /// expiry-driven removal) — this is the signal that downstream rule
    /// realization must be awaited before releasing the packet.
    pub address_update: bool,
    pub current_ips: Vec<IpAddr>,
    pub next_requery: Option<Duration>,
}

impl DnsMeta {
    pub fn from_response(now: DateTime<Utc>, fresh: &[(IpAddr, Duration)]) -> Self {
        let entries = fresh
            .iter()
            .map(|(ip, ttl)| (*ip, IpEntry::new(*ip, *ttl, now)))
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_ips(&self) -> Vec<IpAddr> {
        self.entries.keys().copied().collect()
    }

    /// Implements the merge algorithm of the response-merge step: new IPs
    /// are added, overlapping IPs keep the longer of the two expirations,
    /// and IPs missing from the fresh response are retained while still
    /// unexpired but dropped once they expire.
    pub fn merge(&mut self, now: DateTime<Utc>, fresh: &[(IpAddr, Duration)]) -> MergeOutcome {
        let mut address_update = false;
        let mut seen = std::collections::HashSet::with_capacity(fresh.len());

        for (ip, ttl) in fresh {
            seen.insert(*ip);
            let candidate = IpEntry::new(*ip, *ttl, now);
            match self.entries.get_mut(ip) {
                Some(existing) => {
                    if candidate.expires_at > existing.expires_at {
                        existing.expires_at = candidate.expires_at;
                    }
                }
                None => {
                    self.entries.insert(*ip, candidate);
                    address_update = true;
                }
            }
        }

        self.entries.retain(|ip, entry| {
            if seen.contains(ip) {
                return true;
            }
            if entry.is_expired(now) {
                address_update = true;
                false
            } else {
                true
            }
        });

        let next_requery = self
            .entries
            .values()
            .map(|e| (e.expires_at - now).to_std().unwrap_or(Duration::ZERO))
            .min();

        MergeOutcome {
            address_update,
            current_ips: self.current_ips(),
            next_requery,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn overlap_keeps_longer_ttl() {
        let t0 = now();
        let mut meta =
            DnsMeta::from_response(t0, &[("10.0.0.1".parse().unwrap(), StdDuration::from_secs(30))]);
        let outcome = meta.merge(
            t0 + chrono::Duration::seconds(5),
            &[("10.0.0.1".parse().unwrap(), StdDuration::from_secs(60))],
        );
        assert!(!outcome.address_update);
        let entry = meta.entries.get(&"10.0.0.1".parse().unwrap()).unwrap();
        assert_eq!(entry.expires_at, t0 + chrono::Duration::seconds(65));
    }

    #[test]
    fn absent_but_unexpired_is_retained() {
        let t0 = now();
        let mut meta = DnsMeta::from_response(
            t0,
            &[
                ("10.0.0.1".parse().unwrap(), StdDuration::from_secs(60)),
                ("10.0.0.2".parse().unwrap(), StdDuration::from_secs(60)),
            ],
        );
        let outcome = meta.merge(
            t0 + chrono::Duration::seconds(10),
            &[("10.0.0.1".parse().unwrap(), StdDuration::from_secs(30))],
        );
        assert!(!outcome.address_update);
        assert_eq!(meta.current_ips().len(), 2);
    }

    #[test]
    fn absent_and_expired_is_dropped() {
        let t0 = now();
        let mut meta =
            DnsMeta::from_response(t0, &[("10.0.0.9".parse().unwrap(), StdDuration::from_secs(5))]);
        let outcome = meta.merge(t0 + chrono::Duration::seconds(10), &[]);
        assert!(outcome.address_update);
        assert!(meta.is_empty());
    }

    #[test]
    fn new_ip_triggers_address_update() {
        let t0 = now();
        let mut meta = DnsMeta::default();
        let outcome = meta.merge(t0, &[("10.0.0.1".parse().unwrap(), StdDuration::from_secs(60))]);
        assert!(outcome.address_update);
        assert_eq!(outcome.current_ips, vec!["10.0.0.1".parse::<IpAddr>().unwrap()]);
    }
}
