// alerting/mod.rs - Alert pipeline: generation, rules, sinks, storage

mod generator;
mod rules;
mod sink;
mod store;
mod types;

pub use generator::AlertGenerator;
pub use rules::{ActionChannel, ActionConfig, AlertRule, ConditionField, RuleAction, RuleCondition};
pub use sink::{LogSink, MultiSink, NotificationSink, NotifyError, QueuedSink};
pub use store::AlertStore;
pub use types::{Alert, AlertContext, AlertFilter, AlertId, AlertStats};

#[cfg(test)]
mod tests;
