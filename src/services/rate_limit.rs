//! Request pacing for the embedding provider.
//!
//! Token bucket: `capacity` requests may go out back to back, after which one token is
//! refilled every `interval`. A capacity of one degrades to a fixed minimum delay
//! between consecutive requests.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::trace;

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

/// Async token bucket limiter.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    interval: Duration,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a limiter holding `capacity` tokens, refilled one per `interval`.
    pub fn new(capacity: u32, interval: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            interval,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// At most one request per `interval`.
    pub fn fixed_interval(interval: Duration) -> Self {
        Self::new(1, interval)
    }

    /// A limiter that never waits.
    pub fn unlimited() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Wait until a token is available and take it.
    pub async fn acquire(&self) {
        loop {
            let mut bucket = self.bucket.lock().await;
            let now = Instant::now();
            self.refill(&mut bucket, now);

            if bucket.tokens > 0 {
                bucket.tokens -= 1;
                return;
            }

            let ready_at = bucket.last_refill + self.interval;
            drop(bucket);
            trace!(wait_ms = (ready_at - now).as_millis() as u64, "pacing request");
            sleep_until(ready_at).await;
        }
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        if self.interval.is_zero() {
            bucket.tokens = self.capacity;
            bucket.last_refill = now;
            return;
        }
        // A full bucket does not bank time
        if bucket.tokens >= self.capacity {
            bucket.last_refill = now;
            return;
        }

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let earned = (elapsed.as_nanos() / self.interval.as_nanos()) as u32;
        if earned == 0 {
            return;
        }

        bucket.tokens = bucket.tokens.saturating_add(earned).min(self.capacity);
        bucket.last_refill += self.interval * earned;
        if bucket.tokens >= self.capacity {
            bucket.last_refill = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::fixed_interval(Duration::from_secs(60));
        let start = std::time::Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_interval_spacing() {
        let interval = Duration::from_secs(5);
        let limiter = RateLimiter::fixed_interval(interval);

        let mut stamps = Vec::new();
        for _ in 0..4 {
            limiter.acquire().await;
            stamps.push(Instant::now());
        }

        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= interval);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_pacing() {
        let limiter = RateLimiter::new(3, Duration::from_secs(5));
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unlimited_never_waits() {
        let limiter = RateLimiter::unlimited();
        let start = std::time::Instant::now();
        for _ in 0..100 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
