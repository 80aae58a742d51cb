//! Reconciler configuration

use crate::backoff::Backoff;
use crate::error::Result;
use byocflow_config::Settings;
use std::time::Duration;

/// Timeouts and backoff used by the reconcilers
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilerConfig {
    pub create_timeout: Duration,
    pub delete_timeout: Duration,
    pub agent_timeout: Duration,

    /// Backoff between status probes
    pub backoff: Backoff,

    /// Backoff between describe retries after network errors
    pub network_backoff: Backoff,

    /// Extra describe attempts after a network error (0 = fail at once)
    pub network_retries: u32,
}

impl ReconcilerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            create_timeout: minutes(settings.timeouts.create_minutes),
            delete_timeout: minutes(settings.timeouts.delete_minutes),
            agent_timeout: minutes(settings.timeouts.agent_minutes),
            backoff: Backoff::from_window(&settings.backoff.generic),
            network_backoff: Backoff::from_window(&settings.backoff.network),
            network_retries: settings.network_retries,
        }
    }

    /// Load from the settings file and environment
    pub fn load() -> Result<Self> {
        Ok(Self::from_settings(&Settings::load()?))
    }

    pub fn with_timeouts(mut self, create: Duration, delete: Duration, agent: Duration) -> Self {
        self.create_timeout = create;
        self.delete_timeout = delete;
        self.agent_timeout = agent;
        self
    }

    pub fn with_network_retries(mut self, retries: u32) -> Self {
        self.network_retries = retries;
        self
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

fn minutes(value: u64) -> Duration {
    Duration::from_secs(value.saturating_mul(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReconcilerConfig::default();
        assert_eq!(config.create_timeout, Duration::from_secs(120 * 60));
        assert_eq!(config.delete_timeout, Duration::from_secs(60 * 60));
        assert_eq!(config.agent_timeout, Duration::from_secs(60 * 60));
        assert_eq!(config.backoff, Backoff::generic());
        assert_eq!(config.network_backoff, Backoff::network());
        assert_eq!(config.network_retries, 0);
    }

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default();
        settings.timeouts.create_minutes = 5;
        settings.backoff.generic.min_wait_ms = 100;
        settings.network_retries = 3;

        let config = ReconcilerConfig::from_settings(&settings);
        assert_eq!(config.create_timeout, Duration::from_secs(300));
        assert_eq!(config.backoff.min_wait(), Duration::from_millis(100));
        assert_eq!(config.network_retries, 3);
    }
}
