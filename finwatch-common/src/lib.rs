// finwatch-common: Shared domain types and the constraint evaluation core
// Used by finwatch-core (alerting and service layer)

pub mod constraints;
pub mod logging;
pub mod metrics;
