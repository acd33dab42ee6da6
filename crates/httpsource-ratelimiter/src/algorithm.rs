use crate::config::{Algorithm, RateLimiterConfig};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Outcome of a non-blocking acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// A permit was granted immediately.
    Allowed,
    /// No permit available; retry no sooner than `wait`.
    Denied { wait: Duration },
}

/// Continuous token bucket: tokens refill at a constant rate up to `capacity`.
#[derive(Debug)]
struct TokenBucketState {
    capacity: f64,
    refill_per_second: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucketState {
    fn new(config: &RateLimiterConfig) -> Self {
        Self {
            capacity: config.capacity as f64,
            refill_per_second: config.refill_per_second,
            tokens: config.capacity as f64,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            self.tokens = (self.tokens + elapsed * self.refill_per_second).min(self.capacity);
            self.last_refill = now;
        }
    }

    fn try_acquire(&mut self) -> Decision {
        let now = Instant::now();
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Decision::Allowed
        } else {
            let deficit = 1.0 - self.tokens;
            let wait = if self.refill_per_second > 0.0 {
                Duration::from_secs_f64(deficit / self.refill_per_second)
            } else {
                Duration::MAX
            };
            Decision::Denied { wait }
        }
    }

    fn debit(&mut self, amount: f64) {
        self.refill(Instant::now());
        self.tokens = (self.tokens - amount).max(0.0);
    }

    fn available(&mut self) -> f64 {
        self.refill(Instant::now());
        self.tokens
    }
}

/// Leaky bucket: requests queue into a bucket that drains at a constant rate;
/// a request is admitted only if the bucket has room.
#[derive(Debug)]
struct LeakyBucketState {
    capacity: f64,
    leak_per_second: f64,
    level: f64,
    last_leak: Instant,
}

impl LeakyBucketState {
    fn new(config: &RateLimiterConfig) -> Self {
        Self {
            capacity: config.capacity as f64,
            leak_per_second: config.refill_per_second,
            level: 0.0,
            last_leak: Instant::now(),
        }
    }

    fn leak(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_leak).as_secs_f64();
        if elapsed > 0.0 {
            self.level = (self.level - elapsed * self.leak_per_second).max(0.0);
            self.last_leak = now;
        }
    }

    fn try_acquire(&mut self) -> Decision {
        let now = Instant::now();
        self.leak(now);
        if self.level + 1.0 <= self.capacity {
            self.level += 1.0;
            Decision::Allowed
        } else {
            let overflow = self.level + 1.0 - self.capacity;
            let wait = if self.leak_per_second > 0.0 {
                Duration::from_secs_f64(overflow / self.leak_per_second)
            } else {
                Duration::MAX
            };
            Decision::Denied { wait }
        }
    }

    fn debit(&mut self, amount: f64) {
        self.leak(Instant::now());
        self.level = (self.level + amount).min(self.capacity);
    }

    fn available(&mut self) -> f64 {
        self.leak(Instant::now());
        (self.capacity - self.level).max(0.0)
    }
}

/// Fixed window: all permits reset at aligned interval boundaries.
#[derive(Debug)]
struct FixedWindowState {
    capacity: u64,
    window: Duration,
    remaining: u64,
    window_start: Instant,
}

impl FixedWindowState {
    fn new(config: &RateLimiterConfig) -> Self {
        Self {
            capacity: config.capacity,
            window: config.window,
            remaining: config.capacity,
            window_start: Instant::now(),
        }
    }

    fn maybe_roll(&mut self, now: Instant) {
        if now.duration_since(self.window_start) >= self.window {
            self.remaining = self.capacity;
            self.window_start = now;
        }
    }

    fn try_acquire(&mut self) -> Decision {
        let now = Instant::now();
        self.maybe_roll(now);
        if self.remaining > 0 {
            self.remaining -= 1;
            Decision::Allowed
        } else {
            let wait = self
                .window
                .saturating_sub(now.duration_since(self.window_start));
            Decision::Denied { wait }
        }
    }

    fn available(&mut self) -> u64 {
        self.maybe_roll(Instant::now());
        self.remaining
    }
}

/// Sliding window: a log of recent acquisition timestamps, pruned on each call.
#[derive(Debug)]
struct SlidingWindowState {
    capacity: u64,
    window: Duration,
    log: VecDeque<Instant>,
}

impl SlidingWindowState {
    fn new(config: &RateLimiterConfig) -> Self {
        Self {
            capacity: config.capacity,
            window: config.window,
            log: VecDeque::with_capacity(config.capacity as usize),
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&front) = self.log.front() {
            if now.duration_since(front) >= self.window {
                self.log.pop_front();
            } else {
                break;
            }
        }
    }

    fn try_acquire(&mut self) -> Decision {
        let now = Instant::now();
        self.prune(now);
        if (self.log.len() as u64) < self.capacity {
            self.log.push_back(now);
            Decision::Allowed
        } else {
            let wait = self
                .log
                .front()
                .map(|&oldest| (oldest + self.window).saturating_duration_since(now))
                .unwrap_or(Duration::ZERO);
            Decision::Denied { wait }
        }
    }

    fn available(&mut self) -> u64 {
        self.prune(Instant::now());
        self.capacity.saturating_sub(self.log.len() as u64)
    }
}

/// Enum-dispatched algorithm state, one instance per bucket.
pub(crate) enum AlgorithmState {
    Token(TokenBucketState),
    Leaky(LeakyBucketState),
    Fixed(FixedWindowState),
    Sliding(SlidingWindowState),
}

impl AlgorithmState {
    pub(crate) fn new(config: &RateLimiterConfig) -> Self {
        match config.algorithm {
            Algorithm::TokenBucket => Self::Token(TokenBucketState::new(config)),
            Algorithm::LeakyBucket => Self::Leaky(LeakyBucketState::new(config)),
            Algorithm::FixedWindow => Self::Fixed(FixedWindowState::new(config)),
            Algorithm::SlidingWindow => Self::Sliding(SlidingWindowState::new(config)),
        }
    }

    pub(crate) fn try_acquire(&mut self) -> Decision {
        match self {
            Self::Token(s) => s.try_acquire(),
            Self::Leaky(s) => s.try_acquire(),
            Self::Fixed(s) => s.try_acquire(),
            Self::Sliding(s) => s.try_acquire(),
        }
    }

    /// Applies the one-shot HTTP 429 debit (bucket modes only, spec §4.5).
    pub(crate) fn debit_for_rate_limit(&mut self, penalty: u64) {
        if penalty == 0 {
            return;
        }
        match self {
            Self::Token(s) => s.debit(penalty as f64),
            Self::Leaky(s) => s.debit(penalty as f64),
            Self::Fixed(_) | Self::Sliding(_) => {}
        }
    }

    #[cfg(test)]
    pub(crate) fn available_permits(&mut self) -> f64 {
        match self {
            Self::Token(s) => s.available(),
            Self::Leaky(s) => s.available(),
            Self::Fixed(s) => s.available() as f64,
            Self::Sliding(s) => s.available() as f64,
        }
    }
}
