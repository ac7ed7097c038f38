//! Per-identity sliding-window cap for the public intake endpoint.
//!
//! Process-local and best-effort: counters are lost on restart and are not
//! shared across instances. This deters abusive volume; it is not a security
//! boundary on its own.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Expired entries are swept lazily once the map grows past this many
/// identities, keeping the cache bounded without a background task.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    resets_at: DateTime<Utc>,
}

/// Keyed request counter with a fixed window.
///
/// The check-and-increment is a single guarded step, so a concurrent burst
/// from one identity cannot slip past the cap. The clock is a parameter so
/// tests drive the window without sleeping.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Returns whether the request from `identity` is allowed at `now`.
    ///
    /// A fresh or expired window resets to count 1 and allows; a full window
    /// rejects without incrementing.
    pub fn check(&self, identity: &str, now: DateTime<Utc>) -> bool {
        let mut buckets = self.buckets.lock().expect("rate limit mutex poisoned");

        if buckets.len() > SWEEP_THRESHOLD {
            buckets.retain(|_, window| window.resets_at > now);
        }

        match buckets.get_mut(identity) {
            Some(window) if window.resets_at > now => {
                if window.count >= self.max_requests {
                    return false;
                }
                window.count += 1;
                true
            }
            _ => {
                buckets.insert(
                    identity.to_string(),
                    Window {
                        count: 1,
                        resets_at: now + self.window,
                    },
                );
                true
            }
        }
    }

    /// Number of identities currently tracked (expired or not).
    pub fn tracked_identities(&self) -> usize {
        self.buckets.lock().expect("rate limit mutex poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 12, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn limiter() -> RateLimiter {
        RateLimiter::new(Duration::seconds(60), 5)
    }

    #[test]
    fn allows_up_to_cap_then_rejects_sixth() {
        let limiter = limiter();
        let now = start();
        for attempt in 0..5 {
            assert!(limiter.check("1.2.3.4", now), "attempt {attempt} allowed");
        }
        assert!(!limiter.check("1.2.3.4", now));
    }

    #[test]
    fn rejection_does_not_consume_the_window() {
        let limiter = limiter();
        let now = start();
        for _ in 0..5 {
            limiter.check("1.2.3.4", now);
        }
        // Repeated rejections stay rejections until the window expires.
        assert!(!limiter.check("1.2.3.4", now + Duration::seconds(30)));
        assert!(!limiter.check("1.2.3.4", now + Duration::seconds(59)));
    }

    #[test]
    fn window_expiry_resets_the_counter() {
        let limiter = limiter();
        let now = start();
        for _ in 0..5 {
            limiter.check("1.2.3.4", now);
        }
        assert!(!limiter.check("1.2.3.4", now));
        assert!(limiter.check("1.2.3.4", now + Duration::seconds(61)));
    }

    #[test]
    fn identities_are_counted_independently() {
        let limiter = limiter();
        let now = start();
        for _ in 0..5 {
            assert!(limiter.check("1.2.3.4", now));
        }
        assert!(!limiter.check("1.2.3.4", now));
        assert!(limiter.check("5.6.7.8", now));
        assert!(limiter.check("unknown", now));
    }

    #[test]
    fn burst_from_one_identity_is_serialized() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new(Duration::seconds(60), 5));
        let now = start();
        let handles: Vec<_> = (0..12)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || limiter.check("1.2.3.4", now))
            })
            .collect();

        let allowed = handles
            .into_iter()
            .map(|handle| handle.join().expect("worker thread panicked"))
            .filter(|allowed| *allowed)
            .count();
        assert_eq!(allowed, 5);
    }
}
