mod dns;
mod errors;
mod logging;
mod root;

pub use dns::{DnsConfig, SchedulerConfig};
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
