use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::service::ServiceConfig;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BotSettings {
    pub battle_idle_timeout_secs: u64,
    pub tick_interval_ms: u64,
    pub settlement_retries: u32,

    // Used when RUST_LOG is unset.
    pub log_filter: String,

    /// Overrides the platform data directory for `profiles.json`.
    pub data_dir: Option<PathBuf>,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            battle_idle_timeout_secs: 300,
            tick_interval_ms: 1000,
            settlement_retries: 3,
            log_filter: "info".into(),
            data_dir: None,
        }
    }
}

impl BotSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            idle_timeout: Duration::from_secs(self.battle_idle_timeout_secs),
            settlement_retries: self.settlement_retries,
        }
    }
}
