pub mod query_scheduler;
pub mod runner;

pub use query_scheduler::{QueryScheduler, QuerySchedulerConfig};
pub use runner::JobRunner;
