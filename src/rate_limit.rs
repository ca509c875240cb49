use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::metrics::RATE_LIMIT_ENTRIES;

// Time source, swapped out in tests to cross window boundaries
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// Rate limit entry - tracks submissions per client
#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset: Instant,
}

/// Fixed-window limiter keyed by client identity.
///
/// Each key gets `max_requests` admissions per `window`. The window starts at
/// the first request and the entry resets lazily on the first request after
/// it ends.
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    max_requests: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_clock(max_requests, window, Arc::new(SystemClock))
    }

    pub fn with_clock(max_requests: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            max_requests,
            window,
            clock,
        }
    }

    /// Returns `true` if the client may submit, `false` if it is over the limit.
    pub fn allow(&self, client_id: &str) -> bool {
        let now = self.clock.now();

        // the entry guard holds the shard lock, so read-modify-write is atomic per key
        let mut entry = match self.entries.entry(client_id.to_string()) {
            Entry::Occupied(occupied) => occupied.into_ref(),
            Entry::Vacant(vacant) => {
                vacant.insert(RateLimitEntry {
                    count: 1,
                    window_reset: now + self.window,
                });
                RATE_LIMIT_ENTRIES.inc();
                return true;
            }
        };

        // window expired..? reset it
        if now > entry.window_reset {
            entry.count = 1;
            entry.window_reset = now + self.window;
            return true;
        }

        // under limit..? allow
        if entry.count < self.max_requests {
            entry.count += 1;
            return true;
        }

        debug!(client = %client_id, count = entry.count, "rate limit exceeded");
        false
    }

    /// Drops entries whose window has ended. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now <= entry.window_reset);
        let removed = before.saturating_sub(self.entries.len());
        RATE_LIMIT_ENTRIES.sub(removed as f64);
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, client_id: &str) -> Option<RateLimitEntry> {
        self.entries.get(client_id).map(|e| *e)
    }
}

// Sweep loop - runs every `every` until the process exits
pub async fn sweeper(limiter: Arc<RateLimiter>, every: Duration) {
    // interval() panics on a zero period
    let every = every.max(Duration::from_secs(1));
    let mut interval = tokio::time::interval(every);

    debug!(interval = ?every, "rate limit sweeper started");

    loop {
        interval.tick().await;
        let removed = limiter.sweep();
        if removed > 0 {
            debug!(removed, remaining = limiter.len(), "swept expired rate limit entries");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ManualClock(Mutex<Instant>);

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Instant::now())))
        }

        fn advance(&self, by: Duration) {
            *self.0.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.0.lock().unwrap()
        }
    }

    const WINDOW: Duration = Duration::from_secs(15 * 60);

    #[test]
    fn sixth_request_in_window_is_denied() {
        let limiter = RateLimiter::new(5, WINDOW);
        for i in 0..5 {
            assert!(limiter.allow("10.0.0.1"), "request {} should pass", i + 1);
        }
        assert!(!limiter.allow("10.0.0.1"));
        assert!(!limiter.allow("10.0.0.1"));
        assert_eq!(limiter.entry("10.0.0.1").unwrap().count, 5);
    }

    #[test]
    fn clients_are_counted_separately() {
        let limiter = RateLimiter::new(1, WINDOW);
        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));
        assert!(limiter.allow("b"));
    }

    #[test]
    fn window_expiry_admits_a_new_burst() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(5, WINDOW, clock.clone());

        for _ in 0..5 {
            assert!(limiter.allow("ip"));
        }
        assert!(!limiter.allow("ip"));

        // exactly at the reset time the window is still live
        clock.advance(WINDOW);
        assert!(!limiter.allow("ip"));

        clock.advance(Duration::from_millis(1));
        for _ in 0..5 {
            assert!(limiter.allow("ip"));
        }
        assert!(!limiter.allow("ip"));
        assert_eq!(limiter.entry("ip").unwrap().count, 5);
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(5, WINDOW, clock.clone());

        assert!(limiter.allow("old"));
        clock.advance(Duration::from_secs(10 * 60));
        assert!(limiter.allow("fresh"));
        clock.advance(Duration::from_secs(6 * 60));

        assert_eq!(limiter.sweep(), 1);
        assert!(limiter.entry("old").is_none());
        assert!(limiter.entry("fresh").is_some());
    }

    #[test]
    fn concurrent_burst_admits_exactly_max() {
        let limiter = Arc::new(RateLimiter::new(5, WINDOW));
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || limiter.allow("same-client"))
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 5);
    }
}
