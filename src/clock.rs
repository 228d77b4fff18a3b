use std::cell::Cell;
use std::time::{Duration, Instant};

/// A monotonic point in time, measured from the origin of the clock that
/// produced it. Only compare timestamps coming from the same clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp(Duration);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(Duration::ZERO);

    pub fn from_secs_f64(secs: f64) -> Self {
        Self(Duration::from_secs_f64(secs.max(0.0)))
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_secs_f64()
    }

    /// Seconds elapsed from `earlier` to `self`; never negative.
    pub fn seconds_since(&self, earlier: Timestamp) -> f64 {
        self.0.saturating_sub(earlier.0).as_secs_f64()
    }

    pub fn add_secs(&self, secs: u32) -> Self {
        Self(self.0 + Duration::from_secs(u64::from(secs)))
    }
}

/// Supplies "now" to every timing computation
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Production clock backed by `std::time::Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.origin.elapsed())
    }
}

/// Hand-driven clock for tests and headless drivers
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_secs(&self, secs: f64) {
        self.now.set(Duration::from_secs_f64(secs.max(0.0)));
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.get())
    }
}
