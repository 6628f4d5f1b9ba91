pub mod config;
pub mod dns_meta;
pub mod errors;
pub mod ip_entry;
pub mod rule;
pub mod selector;

pub use config::{CliOverrides, Config};
pub use dns_meta::{DnsMeta, MergeOutcome};
pub use errors::DomainError;
pub use ip_entry::IpEntry;
pub use rule::{PacketHandle, PortId, RecordFamilies, RuleId};
pub use selector::SelectorItem;
