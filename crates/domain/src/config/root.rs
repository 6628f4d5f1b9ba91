use serde::{Deserialize, Serialize};

use super::dns::{DnsConfig, SchedulerConfig};
use super::errors::ConfigError;
use super::logging::LoggingConfig;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    pub dns: DnsConfig,

    pub scheduler: SchedulerConfig,

    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("netpol-fqdn.toml").exists() {
            Self::from_file("netpol-fqdn.toml")?
        } else if std::path::Path::new("/etc/netpol-fqdn/config.toml").exists() {
            Self::from_file("/etc/netpol-fqdn/config.toml")?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(server) = overrides.upstream_server {
            self.dns.upstream_server = Some(server);
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(min_ttl) = overrides.min_ttl_secs {
            self.dns.min_ttl_secs = min_ttl;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dns.enable_ipv4 && !self.dns.enable_ipv6 {
            return Err(ConfigError::Validation(
                "at least one of enable_ipv4/enable_ipv6 must be true".to_string(),
            ));
        }
        if self.scheduler.worker_count == 0 {
            return Err(ConfigError::Validation(
                "scheduler.worker_count must be at least 1".to_string(),
            ));
        }
        if self.scheduler.min_retry_delay_secs > self.scheduler.max_retry_delay_secs {
            return Err(ConfigError::Validation(
                "scheduler.min_retry_delay_secs must not exceed max_retry_delay_secs".to_string(),
            ));
        }
        Ok(())
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let existing = std::fs::read_to_string(path).unwrap_or_default();

        let mut doc = if existing.is_empty() {
            toml_edit::DocumentMut::new()
        } else {
            existing
                .parse::<toml_edit::DocumentMut>()
                .map_err(|e| ConfigError::Parse(format!("failed to parse config file: {e}")))?
        };

        fn set_val(table: &mut toml_edit::Table, key: &str, new_val: toml_edit::Value) {
            match table.get_mut(key) {
                Some(item @ toml_edit::Item::Value(_)) => {
                    let suffix = item.as_value().and_then(|v| v.decor().suffix()).cloned();
                    *item = toml_edit::Item::Value(new_val);
                    if let (Some(s), Some(v)) = (suffix, item.as_value_mut()) {
                        v.decor_mut().set_suffix(s);
                    }
                }
                Some(item) => *item = toml_edit::Item::Value(new_val),
                None => {
                    table.insert(key, toml_edit::Item::Value(new_val));
                }
            }
        }

        if !doc.contains_table("dns") {
            doc.insert("dns", toml_edit::Item::Table(toml_edit::Table::new()));
        }
        if let Some(t) = doc.get_mut("dns").and_then(|i| i.as_table_mut()) {
            if let Some(ref server) = self.dns.upstream_server {
                set_val(t, "upstream_server", toml_edit::Value::from(server.clone()));
            }
            set_val(t, "enable_ipv4", toml_edit::Value::from(self.dns.enable_ipv4));
            set_val(t, "enable_ipv6", toml_edit::Value::from(self.dns.enable_ipv6));
            set_val(t, "min_ttl_secs", toml_edit::Value::from(self.dns.min_ttl_secs as i64));
            set_val(
                t,
                "query_timeout_secs",
                toml_edit::Value::from(self.dns.query_timeout_secs as i64),
            );
            set_val(
                t,
                "realization_timeout_ms",
                toml_edit::Value::from(self.dns.realization_timeout_ms as i64),
            );
        }

        if !doc.contains_table("scheduler") {
            doc.insert("scheduler", toml_edit::Item::Table(toml_edit::Table::new()));
        }
        if let Some(t) = doc.get_mut("scheduler").and_then(|i| i.as_table_mut()) {
            set_val(t, "worker_count", toml_edit::Value::from(self.scheduler.worker_count as i64));
            set_val(
                t,
                "min_retry_delay_secs",
                toml_edit::Value::from(self.scheduler.min_retry_delay_secs as i64),
            );
            set_val(
                t,
                "max_retry_delay_secs",
                toml_edit::Value::from(self.scheduler.max_retry_delay_secs as i64),
            );
        }

        if !doc.contains_table("logging") {
            doc.insert("logging", toml_edit::Item::Table(toml_edit::Table::new()));
        }
        if let Some(t) = doc.get_mut("logging").and_then(|i| i.as_table_mut()) {
            set_val(t, "level", toml_edit::Value::from(self.logging.level.clone()));
        }

        std::fs::write(path, doc.to_string())
            .map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub upstream_server: Option<String>,
    pub log_level: Option<String>,
    pub min_ttl_secs: Option<u64>,
}
