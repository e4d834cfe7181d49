// config.rs - Settings loading for the monitoring pipeline

use config::{Config, ConfigError, File};
use finwatch_common::constraints::Constraint;
use serde::Deserialize;

/// Alerting options.
#[derive(Debug, Deserialize, Clone)]
pub struct AlertingConfig {
    /// Enable notification dispatch; generation is unaffected
    #[serde(default = "default_alerting_enabled")]
    pub enabled: bool,
    /// Cooldown between repeated firings of one rule, in seconds
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Bounded capacity of the background dispatch queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_alerting_enabled() -> bool {
    true
}

fn default_cooldown_secs() -> u64 {
    300
}

fn default_queue_capacity() -> usize {
    256
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            enabled: default_alerting_enabled(),
            cooldown_secs: default_cooldown_secs(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Top-level settings.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub alerting: AlertingConfig,
    /// Starting constraint set; durability stays with the embedding
    /// application
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl Settings {
    /// Load settings for the current run mode.
    ///
    /// Reads `config/{RUN_MODE}` (defaulting to `development`), then
    /// applies environment overrides:
    /// - `ALERTING_ENABLED` for `alerting.enabled`
    /// - `ALERT_COOLDOWN_SECS` for `alerting.cooldown_secs`
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        if let Ok(enabled) = std::env::var("ALERTING_ENABLED") {
            builder = builder.set_override("alerting.enabled", enabled)?;
        }
        if let Ok(cooldown) = std::env::var("ALERT_COOLDOWN_SECS") {
            builder = builder.set_override("alerting.cooldown_secs", cooldown)?;
        }

        builder.build()?.try_deserialize()
    }
}
