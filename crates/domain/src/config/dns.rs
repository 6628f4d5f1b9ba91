use serde::{Deserialize, Serialize};

fn default_min_ttl() -> u64 {
    5
}

fn default_query_timeout() -> u64 {
    10
}

fn default_realization_timeout_ms() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

/// DNS resolution behavior: which upstream to query, which families to
/// resolve, and the TTL floor applied to every cached record.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    /// Explicit upstream server, e.g. "10.96.0.10:53". When absent, the
    /// cluster DNS service environment variables are consulted, then the
    /// host resolver.
    #[serde(default)]
    pub upstream_server: Option<String>,

    #[serde(default = "default_true")]
    pub enable_ipv4: bool,

    #[serde(default = "default_true")]
    pub enable_ipv6: bool,

    #[serde(default = "default_min_ttl")]
    pub min_ttl_secs: u64,

    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,

    #[serde(default = "default_realization_timeout_ms")]
    pub realization_timeout_ms: u64,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            upstream_server: None,
            enable_ipv4: true,
            enable_ipv6: true,
            min_ttl_secs: default_min_ttl(),
            query_timeout_secs: default_query_timeout(),
            realization_timeout_ms: default_realization_timeout_ms(),
        }
    }
}

fn default_worker_count() -> usize {
    4
}

fn default_min_retry_delay_secs() -> u64 {
    1
}

fn default_max_retry_delay_secs() -> u64 {
    60
}

/// Query scheduler tuning: worker pool size and exponential backoff bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_min_retry_delay_secs")]
    pub min_retry_delay_secs: u64,

    #[serde(default = "default_max_retry_delay_secs")]
    pub max_retry_delay_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            min_retry_delay_secs: default_min_retry_delay_secs(),
            max_retry_delay_secs: default_max_retry_delay_secs(),
        }
    }
}
