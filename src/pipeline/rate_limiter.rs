// src/pipeline/rate_limiter.rs
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

const MILLIS_PER_HOUR: u64 = 3_600_000;

/// Monotonic time source the rate limiter waits on
#[async_trait]
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;

    async fn sleep(&self, duration: Duration);
}

pub struct SystemClock {
    origin: tokio::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock: `sleep` returns immediately after advancing `now`
#[derive(Debug, Default)]
pub struct ManualClock {
    elapsed_nanos: AtomicU64,
    slept_nanos: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.elapsed_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Total virtual time spent inside `sleep`
    pub fn total_slept(&self) -> Duration {
        Duration::from_nanos(self.slept_nanos.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
    }

    async fn sleep(&self, duration: Duration) {
        self.slept_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
        self.advance(duration);
    }
}

/// Per-source spacing policy. A source with a rate limit of `R` requests per
/// hour gets at most one slot every `3_600_000 / R` ms.
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    fallback_delay: Duration,
    last_slot: Mutex<HashMap<String, Duration>>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>, fallback_delay: Duration) -> Self {
        Self {
            clock,
            fallback_delay,
            last_slot: Mutex::new(HashMap::new()),
        }
    }

    /// Minimum spacing between two slots for a source; a zero rate uses the fallback
    pub fn delay_for(&self, rate_limit: u32) -> Duration {
        if rate_limit == 0 {
            return self.fallback_delay;
        }
        Duration::from_millis(MILLIS_PER_HOUR / u64::from(rate_limit))
    }

    /// Waits until `source` may be contacted again and claims the slot.
    /// The first slot for a source is granted immediately. Returns the time waited.
    pub async fn wait_for_slot(&self, source: &str, rate_limit: u32) -> Duration {
        let delay = self.delay_for(rate_limit);

        let wait = {
            let last_slot = self.last_slot.lock().await;
            match last_slot.get(source) {
                Some(previous) => (*previous + delay).saturating_sub(self.clock.now()),
                None => Duration::ZERO,
            }
        };

        if !wait.is_zero() {
            debug!(source, wait_ms = wait.as_millis() as u64, "Waiting for rate limit slot");
            self.clock.sleep(wait).await;
        }

        self.last_slot
            .lock()
            .await
            .insert(source.to_string(), self.clock.now());
        wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> (Arc<ManualClock>, RateLimiter) {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::new(clock.clone(), Duration::from_millis(5000));
        (clock, limiter)
    }

    #[test]
    fn test_delay_from_hourly_rate() {
        let (_, limiter) = limiter();
        assert_eq!(limiter.delay_for(60), Duration::from_secs(60));
        assert_eq!(limiter.delay_for(30), Duration::from_secs(120));
        assert_eq!(limiter.delay_for(0), Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn test_first_slot_is_free_then_spaced() {
        let (clock, limiter) = limiter();

        assert_eq!(limiter.wait_for_slot("GitHub", 60).await, Duration::ZERO);
        assert_eq!(
            limiter.wait_for_slot("GitHub", 60).await,
            Duration::from_secs(60)
        );
        assert_eq!(clock.now(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_elapsed_time_counts_toward_spacing() {
        let (clock, limiter) = limiter();

        limiter.wait_for_slot("GitHub", 60).await;
        clock.advance(Duration::from_secs(45));
        assert_eq!(
            limiter.wait_for_slot("GitHub", 60).await,
            Duration::from_secs(15)
        );

        clock.advance(Duration::from_secs(300));
        assert_eq!(limiter.wait_for_slot("GitHub", 60).await, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_sources_are_tracked_independently() {
        let (clock, limiter) = limiter();

        limiter.wait_for_slot("GitHub", 60).await;
        assert_eq!(
            limiter.wait_for_slot("StackOverflow", 30).await,
            Duration::ZERO
        );
        assert_eq!(clock.total_slept(), Duration::ZERO);
    }
}
