//! Timer primitives used by the live session.
//!
//! - [`Stopwatch`] measures monotonic elapsed time.
//! - [`Countdown`] is anchored to a wall-clock end time. Remaining time is
//!   recomputed from that anchor on every read, so late, dropped or
//!   backgrounded ticks never stretch a rest or hold.
//!
//! Both read time through [`Clock`] so tests can drive them with
//! [`ManualClock`].

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Source of wall-clock and monotonic time
pub trait Clock {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;

    /// Monotonic time since an arbitrary, fixed origin
    fn monotonic(&self) -> std::time::Duration;
}

/// Clock backed by the operating system
#[derive(Clone, Debug)]
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
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn monotonic(&self) -> std::time::Duration {
        self.origin.elapsed()
    }
}

/// Hand-advanced clock. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualTime>>,
}

#[derive(Debug)]
struct ManualTime {
    wall: DateTime<Utc>,
    monotonic: std::time::Duration,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualTime {
                wall: start,
                monotonic: std::time::Duration::ZERO,
            })),
        }
    }

    /// Move both wall-clock and monotonic time forward
    pub fn advance(&self, by: std::time::Duration) {
        let mut time = self.lock();
        time.monotonic += by;
        time.wall += Duration::from_std(by).unwrap_or_else(|_| Duration::zero());
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(std::time::Duration::from_secs(secs));
    }

    pub fn advance_millis(&self, millis: u64) {
        self.advance(std::time::Duration::from_millis(millis));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualTime> {
        // A poisoned lock only means another holder panicked mid-advance;
        // the stored time is still coherent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.lock().wall
    }

    fn monotonic(&self) -> std::time::Duration {
        self.lock().monotonic
    }
}

// ============================================================================
// Stopwatch
// ============================================================================

/// Measures monotonic time since it was started
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stopwatch {
    started: std::time::Duration,
}

impl Stopwatch {
    /// A stopwatch running from the clock's current reading
    pub fn started(clock: &impl Clock) -> Self {
        Self::started_ago(clock, std::time::Duration::ZERO)
    }

    /// A stopwatch that began `ago` before the clock's current reading
    pub fn started_ago(clock: &impl Clock, ago: std::time::Duration) -> Self {
        Self {
            started: clock.monotonic().saturating_sub(ago),
        }
    }

    pub fn elapsed(&self, clock: &impl Clock) -> std::time::Duration {
        clock.monotonic().saturating_sub(self.started)
    }

    /// Whole elapsed seconds, rounded down
    pub fn elapsed_secs(&self, clock: &impl Clock) -> u64 {
        self.elapsed(clock).as_secs()
    }
}

// ============================================================================
// Countdown
// ============================================================================

/// Countdown towards a fixed wall-clock target
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Countdown {
    target_end: DateTime<Utc>,
    granularity: Duration,
}

impl Countdown {
    /// Start a countdown of `seconds` from the clock's current time
    pub fn start(clock: &impl Clock, seconds: u32, granularity: Duration) -> Self {
        Self::starting_at(clock.now(), seconds, granularity)
    }

    /// Start a countdown of `seconds` from an explicit anchor
    pub fn starting_at(start: DateTime<Utc>, seconds: u32, granularity: Duration) -> Self {
        let granularity = if granularity <= Duration::zero() {
            Duration::seconds(1)
        } else {
            granularity
        };
        Self {
            target_end: start + Duration::seconds(i64::from(seconds)),
            granularity,
        }
    }

    pub fn target_end(&self) -> DateTime<Utc> {
        self.target_end
    }

    /// `max(0, ceil((target_end - now) / granularity))`
    pub fn remaining_ticks(&self, clock: &impl Clock) -> u64 {
        let left = self.target_end - clock.now();
        if left <= Duration::zero() {
            return 0;
        }
        let left_ms = left.num_milliseconds();
        let step_ms = self.granularity.num_milliseconds().max(1);
        ((left_ms + step_ms - 1) / step_ms) as u64
    }

    /// Remaining time in whole seconds, rounded up
    pub fn remaining_secs(&self, clock: &impl Clock) -> u64 {
        let left = self.target_end - clock.now();
        if left <= Duration::zero() {
            return 0;
        }
        ((left.num_milliseconds() + 999) / 1000) as u64
    }

    pub fn is_expired(&self, clock: &impl Clock) -> bool {
        self.remaining_ticks(clock) == 0
    }
}
