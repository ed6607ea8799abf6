//! # Global client configuration.
//!
//! Provides [`Config`] centralized settings for the channel manager, the
//! emergency orchestrator and the location beacon.
//!
//! Config is used in three places:
//! 1. **Channel manager**: retry policy, handshake timeout, bus capacity.
//! 2. **Orchestrator**: per-step timeout, nearby-operator radius.
//! 3. **Beacon controller**: position watch options.
//!
//! ## Defaults
//! The retry cap and interval are deliberately conservative: the channel is a
//! client-side component with a human operator who can always retry manually,
//! so a fixed interval with a hard cap bounds resource usage under prolonged
//! outages while keeping recovery predictable.

use std::time::Duration;

use crate::beacon::WatchOptions;

/// Configuration for the alertwire client runtime.
///
/// ## Field semantics
/// - `retry_interval`: fixed delay between automatic reconnect attempts
///   (no exponential growth)
/// - `max_reconnect_attempts`: hard cap on automatic reconnects; once reached
///   the channel parks in `Disconnected` until an explicit `connect()`
/// - `handshake_timeout`: deadline for one connection attempt
/// - `step_timeout`: deadline for each dispatch-step collaborator call
/// - `nearby_radius_m`: radius for the nearby-operator notification step
/// - `bus_capacity`: telemetry bus ring buffer size (min 1; clamped by Bus)
/// - `high_accuracy` / `sample_timeout`: position watch options for the beacon
#[derive(Clone, Debug)]
pub struct Config {
    /// Fixed delay between automatic reconnect attempts.
    ///
    /// The interval never grows: the retry policy is fixed-interval by design,
    /// bounded by `max_reconnect_attempts`.
    pub retry_interval: Duration,

    /// Maximum number of automatic reconnect attempts.
    ///
    /// The counter covers attempts since the last explicit `connect()` and is
    /// reset only by another explicit `connect()`, not by a successful
    /// connection. `0` disables automatic reconnection entirely.
    pub max_reconnect_attempts: u32,

    /// Deadline for one connection handshake.
    ///
    /// Expiry counts as a failed attempt and arms the retry policy.
    pub handshake_timeout: Duration,

    /// Deadline for each dispatch-step collaborator call.
    ///
    /// Expiry is recorded as a failed step; the remaining steps still run.
    pub step_timeout: Duration,

    /// Radius in meters for the nearby-operator notification step.
    pub nearby_radius_m: u32,

    /// Capacity of the telemetry bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events will
    /// observe `Lagged` and skip older items. Minimum value is 1.
    pub bus_capacity: usize,

    /// Request high-accuracy position fixes for the beacon watch.
    pub high_accuracy: bool,

    /// Deadline for a single position sample.
    pub sample_timeout: Duration,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the position watch options derived from this config.
    ///
    /// Stale fixes are never served from cache: the beacon always wants a
    /// fresh position for an active emergency.
    #[inline]
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            high_accuracy: self.high_accuracy,
            sample_timeout: self.sample_timeout,
            max_age: Duration::ZERO,
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `retry_interval = 3s` (fixed, no growth)
    /// - `max_reconnect_attempts = 5`
    /// - `handshake_timeout = 10s`
    /// - `step_timeout = 10s`
    /// - `nearby_radius_m = 5000` (5 km)
    /// - `bus_capacity = 1024`
    /// - `high_accuracy = true`, `sample_timeout = 15s`
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(3),
            max_reconnect_attempts: 5,
            handshake_timeout: Duration::from_secs(10),
            step_timeout: Duration::from_secs(10),
            nearby_radius_m: 5_000,
            bus_capacity: 1024,
            high_accuracy: true,
            sample_timeout: Duration::from_secs(15),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let cfg = Config::default();
        assert_eq!(cfg.retry_interval, Duration::from_secs(3));
        assert_eq!(cfg.max_reconnect_attempts, 5);
        assert_eq!(cfg.nearby_radius_m, 5_000);
    }

    #[test]
    fn bus_capacity_is_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn watch_options_never_cache() {
        let opts = Config::default().watch_options();
        assert!(opts.high_accuracy);
        assert_eq!(opts.max_age, Duration::ZERO);
    }
}
