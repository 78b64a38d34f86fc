//! Per-client rate limiting for booking submissions.
//!
//! [`SlidingWindowLimiter`] remembers when each client's accepted submissions
//! happened and refuses a new one while `max_requests` of them are still
//! inside the window. Rejected attempts are not recorded, so a client that
//! keeps hammering the endpoint is let back in as soon as its oldest accepted
//! submission ages out.
//!
//! Time comes from a [`Clock`] so tests can move it by hand.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decides whether a client may submit right now.
pub trait RateLimiter: Send + Sync {
    /// Record an attempt for `key` and report whether it is allowed.
    fn check(&self, key: &str) -> bool;

    /// Forget clients with no submissions left in the window. Returns how many
    /// were dropped.
    fn evict_idle(&self) -> usize;
}

/// Sliding-window limiter held in memory.
pub struct SlidingWindowLimiter<C: Clock = SystemClock> {
    window: Duration,
    max_requests: usize,
    clock: C,
    entries: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter<SystemClock> {
    /// Create a limiter on the system clock.
    #[must_use]
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self::with_clock(window, max_requests, SystemClock)
    }
}

impl<C: Clock> SlidingWindowLimiter<C> {
    /// Create a limiter on the given clock.
    #[must_use]
    pub fn with_clock(window: Duration, max_requests: usize, clock: C) -> Self {
        Self {
            window,
            max_requests,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of clients currently tracked.
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn prune(&self, timestamps: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = timestamps.front() {
            if now.saturating_duration_since(oldest) < self.window {
                break;
            }
            timestamps.pop_front();
        }
    }
}

impl<C: Clock> RateLimiter for SlidingWindowLimiter<C> {
    fn check(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let timestamps = entries.entry(key.to_string()).or_default();

        self.prune(timestamps, now);

        if timestamps.len() >= self.max_requests {
            debug!(key, recent = timestamps.len(), "Rate limit reached");
            return false;
        }

        timestamps.push_back(now);
        true
    }

    fn evict_idle(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();

        entries.retain(|_, timestamps| {
            self.prune(timestamps, now);
            !timestamps.is_empty()
        });

        before - entries.len()
    }
}

impl<C: Clock> fmt::Debug for SlidingWindowLimiter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("window", &self.window)
            .field("max_requests", &self.max_requests)
            .field("tracked_keys", &self.tracked_keys())
            .finish_non_exhaustive()
    }
}
