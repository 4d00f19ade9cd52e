use std::fmt;
use std::ops::Sub;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SimTime
// ---------------------------------------------------------------------------

/// Integer-nanosecond simulation clock.
///
/// Elapsed time is kept as a monotonically increasing `u64` nanosecond count
/// so long runs do not accumulate floating-point drift. Per-tick math still
/// works in `f32` seconds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SimTime {
    nanos: u64,
}

impl SimTime {
    /// Create a new `SimTime` at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { nanos: 0 }
    }

    /// Create a `SimTime` from a raw nanosecond count.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Create a `SimTime` from seconds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_secs(secs: f64) -> Self {
        Self {
            nanos: (secs.max(0.0) * 1_000_000_000.0).round() as u64,
        }
    }

    /// Raw nanosecond count.
    #[must_use]
    pub const fn nanos(&self) -> u64 {
        self.nanos
    }

    /// Elapsed milliseconds (truncated).
    #[must_use]
    pub const fn millis(&self) -> u64 {
        self.nanos / 1_000_000
    }

    /// Elapsed seconds as `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn secs_f64(&self) -> f64 {
        self.nanos as f64 / 1_000_000_000.0
    }

    /// Elapsed seconds as `f32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn secs_f32(&self) -> f32 {
        self.secs_f64() as f32
    }

    /// Advance the clock by `delta_secs` seconds. Negative deltas are ignored.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn advance_secs(&mut self, delta_secs: f64) {
        let delta_nanos = (delta_secs.max(0.0) * 1_000_000_000.0).round() as u64;
        self.nanos = self.nanos.saturating_add(delta_nanos);
    }

    /// Reset the clock to zero.
    pub const fn reset(&mut self) {
        self.nanos = 0;
    }
}

impl Sub for SimTime {
    type Output = Duration;

    /// Saturating difference between two times.
    fn sub(self, rhs: Self) -> Duration {
        Duration::from_nanos(self.nanos.saturating_sub(rhs.nanos))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.nanos / 1_000_000_000;
        let millis = (self.nanos % 1_000_000_000) / 1_000_000;
        write!(f, "{total_secs}.{millis:03}s")
    }
}

// ---------------------------------------------------------------------------
// TickClock
// ---------------------------------------------------------------------------

/// Fixed-step ticker for headless runs and tests.
///
/// Each call to [`tick`](Self::tick) advances simulated time by one `dt` and
/// hands that delta to the caller. Hosts with variable frame times call
/// [`tick_by`](Self::tick_by) with the measured delta instead.
#[derive(Debug, Clone)]
pub struct TickClock {
    dt: f32,
    time: SimTime,
    ticks: u64,
}

impl TickClock {
    /// Create a clock with a fixed step of `dt` seconds.
    #[must_use]
    pub const fn new(dt: f32) -> Self {
        Self {
            dt,
            time: SimTime::new(),
            ticks: 0,
        }
    }

    /// Advance by the fixed step, returning it.
    pub fn tick(&mut self) -> f32 {
        self.tick_by(self.dt)
    }

    /// Advance by an explicit delta, returning it.
    pub fn tick_by(&mut self, dt: f32) -> f32 {
        self.time.advance_secs(f64::from(dt));
        self.ticks += 1;
        dt
    }

    /// The fixed step in seconds.
    #[must_use]
    pub const fn dt(&self) -> f32 {
        self.dt
    }

    /// Simulated time elapsed so far.
    #[must_use]
    pub const fn time(&self) -> SimTime {
        self.time
    }

    /// Number of ticks taken.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of fixed ticks covering `secs` seconds, rounded up.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn ticks_for(&self, secs: f32) -> u64 {
        if self.dt <= 0.0 {
            return 0;
        }
        (secs / self.dt).ceil().max(0.0) as u64
    }

    /// Reset time and tick count.
    pub const fn reset(&mut self) {
        self.time.reset();
        self.ticks = 0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
