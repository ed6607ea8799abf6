//! # Position source seam for the location beacon.
//!
//! [`PositionSource`] abstracts the platform geolocation service: it starts a
//! continuous watch that pushes samples into a callback until cancelled.
//! Production code wraps the platform API; tests use a fake that records
//! watches and lets the test drive samples by hand.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::error::BeaconError;

/// Options for one position watch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchOptions {
    /// Request high-accuracy fixes (GPS rather than network).
    pub high_accuracy: bool,
    /// Deadline for a single sample.
    pub sample_timeout: Duration,
    /// Maximum acceptable age of a cached fix. The beacon always passes
    /// [`Duration::ZERO`]: stale fixes are useless for an active emergency.
    pub max_age: Duration,
}

/// One position fix.
#[derive(Clone, Debug)]
pub struct PositionSample {
    pub lat: f64,
    pub lng: f64,
    /// Fix accuracy in meters, when the platform reports it.
    pub accuracy: Option<f64>,
    /// Wall-clock time of the fix.
    pub at: SystemTime,
}

/// Opaque handle identifying one active watch at the source.
pub type WatchToken = u64;

/// Callback receiving each position sample.
pub type SampleFn = Arc<dyn Fn(PositionSample) + Send + Sync + 'static>;

/// Callback receiving watch-time sample errors.
pub type WatchErrorFn = Arc<dyn Fn(BeaconError) + Send + Sync + 'static>;

/// Continuous position sampling service.
pub trait PositionSource: Send + Sync + 'static {
    /// Starts a watch; `on_sample` fires for every fix and `on_error` for
    /// sample failures until [`cancel`](Self::cancel) is called with the
    /// returned token.
    fn watch(
        &self,
        opts: WatchOptions,
        on_sample: SampleFn,
        on_error: WatchErrorFn,
    ) -> Result<WatchToken, BeaconError>;

    /// Cancels an active watch. No-op for unknown tokens.
    fn cancel(&self, token: WatchToken);
}
