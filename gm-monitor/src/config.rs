//! Monitor configuration
//!
//! Tuning knobs of the poll scheduler: how often a cycle starts, how many
//! repositories are fetched at once, and how long a cycle may take before
//! outstanding fetches are recorded as timeouts.

use std::time::Duration;

/// Poll scheduler configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between the end of one cycle and the start of the next
    pub poll_interval: Duration,

    /// Maximum number of fetches in flight at once
    ///
    /// Kept small so a large watch-list does not trip the provider's own
    /// rate limits.
    pub max_in_flight: usize,

    /// Deadline for a whole cycle, measured from its start
    pub cycle_timeout: Duration,
}

impl MonitorConfig {
    /// Creates a configuration with the given interval and default bounds
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            max_in_flight: 4,
            cycle_timeout: Duration::from_secs(45),
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub fn with_cycle_timeout(mut self, cycle_timeout: Duration) -> Self {
        self.cycle_timeout = cycle_timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.max_in_flight == 0 {
            anyhow::bail!("max_in_flight must be greater than 0");
        }

        if self.cycle_timeout.is_zero() {
            anyhow::bail!("cycle_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}
