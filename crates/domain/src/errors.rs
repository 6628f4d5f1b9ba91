use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid fqdn '{0}'")]
    InvalidFqdn(String),

    #[error("invalid wildcard pattern '{0}': {1}")]
    InvalidWildcardPattern(String, String),

    #[error("rule '{0}' not found")]
    RuleNotFound(String),

    #[error("upstream dns query for '{0}' timed out")]
    QueryTimeout(String),

    #[error("upstream dns query for '{0}' failed: {1}")]
    QueryFailed(String, String),

    #[error("failed to parse dns response: {0}")]
    InvalidDnsResponse(String),

    #[error("failed to parse intercepted packet: {0}")]
    PacketParseError(String),

    #[error("datapath operation failed: {0}")]
    DatapathError(String),

    #[error("rule realization for '{0}' timed out")]
    RealizationTimeout(String),

    #[error("rule realization for '{0}' failed: {1}")]
    RealizationFailed(String, String),

    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
