use chrono::{Local, NaiveDate, NaiveDateTime, TimeDelta};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Clock used for decision timestamps and feedback timing.
///
/// Timestamps are wall-clock readings so they can be written to the result
/// file, but implementations must never let them run backwards.
pub trait Timer: Clone + Send + Sync {
    fn now(&self) -> NaiveDateTime;
    fn elapsed(&self, since: NaiveDateTime) -> Duration;
    fn sleep(&self, d: Duration);
}

/// Wall clock anchored once at construction and advanced by a monotonic
/// `Instant`, so NTP steps during a session cannot reorder timestamps.
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    pub start: Instant,
    pub wall_start: NaiveDateTime,
}

impl Timer for HighPrecisionTimer {
    fn now(&self) -> NaiveDateTime {
        let since_start = TimeDelta::from_std(self.start.elapsed()).unwrap_or(TimeDelta::zero());
        self.wall_start + since_start
    }
    fn elapsed(&self, since: NaiveDateTime) -> Duration {
        (self.now() - since).to_std().unwrap_or(Duration::ZERO)
    }
    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            wall_start: Local::now().naive_local(),
        }
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(not(target_os = "linux"))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC, EINTR};

        let mut req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };
        let mut rem = timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };

        // Resume with the remainder when a signal cuts the sleep short.
        while unsafe { clock_nanosleep(CLOCK_MONOTONIC, 0, &req, &mut rem) } == EINTR {
            req = rem;
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic clock for tests and scripted replay.
///
/// Every `now()` reading advances the clock by `tick`, so consecutive
/// timestamps are strictly increasing. `sleep` advances instead of blocking.
#[derive(Debug, Clone)]
pub struct ManualTimer {
    current: Arc<Mutex<NaiveDateTime>>,
    tick: Duration,
}

impl ManualTimer {
    pub fn new(start: NaiveDateTime) -> Self {
        Self::with_tick(start, Duration::ZERO)
    }

    pub fn with_tick(start: NaiveDateTime, tick: Duration) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
            tick,
        }
    }

    /// Fixed start at 2024-02-07 09:00:00 with a 250 ms tick.
    pub fn fixed() -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 2, 7)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .unwrap_or_default();
        Self::with_tick(start, Duration::from_millis(250))
    }

    pub fn advance(&self, d: Duration) {
        let mut current = self.lock();
        *current += TimeDelta::from_std(d).unwrap_or(TimeDelta::zero());
    }

    /// Reading without advancing.
    pub fn peek(&self) -> NaiveDateTime {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, NaiveDateTime> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> NaiveDateTime {
        let reading = self.peek();
        self.advance(self.tick);
        reading
    }
    fn elapsed(&self, since: NaiveDateTime) -> Duration {
        (self.peek() - since).to_std().unwrap_or(Duration::ZERO)
    }
    fn sleep(&self, d: Duration) {
        self.advance(d)
    }
}
