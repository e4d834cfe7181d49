pub mod errors;
pub mod monitor;
pub mod types;

// Re-export main interfaces
pub use errors::{ServiceError, ServiceResult};
pub use monitor::MonitorService;
pub use types::*;
