pub mod auto_ack_reconciler;
pub mod logging_datapath;

pub use auto_ack_reconciler::AutoAckReconciler;
pub use logging_datapath::LoggingDatapath;
