// service/errors.rs - Error types for the monitoring service

use thiserror::Error;

/// Errors from the monitoring service facade.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration value out of range or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Settings could not be loaded
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    /// Constraint from configuration failed validation
    #[error("Invalid constraint '{id}': {reasons}")]
    InvalidConstraint { id: String, reasons: String },
}

/// Convenience alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
