pub mod ports;
pub mod services;
pub mod use_cases;

pub use use_cases::FqdnPolicyController;
