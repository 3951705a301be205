//! Configuration for the sync engine and the simulated remote.

use std::time::Duration;

/// Shortest periodic sync interval.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Interval between periodic sync cycles.
    pub interval: Duration,
    /// Timeout applied to each remote call.
    pub timeout: Duration,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
    /// Name of the periodic sync task, used in logs.
    pub task_name: String,
}

impl SyncConfig {
    /// Creates a new sync configuration with default values.
    pub fn new() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
            event_capacity: 64,
            task_name: "quote-sync".into(),
        }
    }

    /// Sets the periodic sync interval, at least [`MIN_INTERVAL`].
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    /// Sets the remote call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Sets the periodic task name.
    pub fn with_task_name(mut self, name: impl Into<String>) -> Self {
        self.task_name = name.into();
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for [`crate::SimulatedRemote`].
#[derive(Debug, Clone)]
pub struct SimulatedRemoteConfig {
    /// Probability in `[0, 1]` that a call fails transiently.
    pub failure_rate: f64,
    /// Seed for the failure RNG.
    pub seed: u64,
    /// Simulated round-trip latency.
    pub latency: Duration,
}

impl SimulatedRemoteConfig {
    /// Creates a configuration for a reliable, instant remote.
    pub fn new() -> Self {
        Self {
            failure_rate: 0.0,
            seed: 0,
            latency: Duration::ZERO,
        }
    }

    /// Sets the failure rate, clamped to `[0, 1]`.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the simulated latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl Default for SimulatedRemoteConfig {
    fn default() -> Self {
        Self::new()
    }
}
