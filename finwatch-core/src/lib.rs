// finwatch-core library: alerting pipeline and service facade
// Shared domain types are in finwatch-common crate

pub mod alerting;
pub mod config;
pub mod service;

// Re-export finwatch-common for convenience
pub use finwatch_common::{constraints, metrics};
