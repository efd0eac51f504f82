use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("rate limiter permit not granted within {0:?}")]
    AcquireTimeout(Duration),
}

/// Process-wide token bucket bounding the aggregate outbound request rate to
/// the remote speech service.
///
/// `limit_for_period` permits become available at each `refresh_period`
/// boundary. `acquire` waits across refills until a permit is granted, bounded
/// by `acquire_timeout`. One instance is created at startup and injected into
/// every dispatcher, so unrelated pipeline invocations draw from the same
/// bucket.
pub struct RateLimiter {
    limit_for_period: u32,
    refresh_period: Duration,
    acquire_timeout: Duration,
    state: Mutex<BucketState>,
}

struct BucketState {
    available: u32,
    period_start: Instant,
}

impl RateLimiter {
    pub fn new(limit_for_period: u32, refresh_period: Duration, acquire_timeout: Duration) -> Self {
        Self {
            limit_for_period,
            // A zero period would make the refill arithmetic divide by zero.
            refresh_period: refresh_period.max(Duration::from_millis(1)),
            acquire_timeout,
            state: Mutex::new(BucketState {
                available: limit_for_period,
                period_start: Instant::now(),
            }),
        }
    }

    /// Take one permit, waiting for a refill if the bucket is empty.
    pub async fn acquire(&self) -> Result<(), RateLimitError> {
        tokio::time::timeout(self.acquire_timeout, self.wait_for_permit())
            .await
            .map_err(|_| RateLimitError::AcquireTimeout(self.acquire_timeout))
    }

    async fn wait_for_permit(&self) {
        loop {
            let next_refill = {
                let mut state = self.state.lock().await;
                let now = Instant::now();

                let elapsed = now.duration_since(state.period_start);
                if elapsed >= self.refresh_period {
                    // Advance to the period containing `now`; intermediate
                    // periods never accumulate extra permits.
                    let periods = elapsed.as_nanos() / self.refresh_period.as_nanos();
                    state.period_start += self.refresh_period * periods as u32;
                    state.available = self.limit_for_period;
                }

                if state.available > 0 {
                    state.available -= 1;
                    return;
                }

                state.period_start + self.refresh_period
            };

            tokio::time::sleep_until(next_refill).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(permits: u32) -> RateLimiter {
        RateLimiter::new(
            permits,
            Duration::from_secs(1),
            Duration::from_secs(5),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_permits_within_limit_are_immediate() {
        let limiter = limiter(5);
        let start = Instant::now();

        for _ in 0..5 {
            limiter.acquire().await.unwrap();
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_twenty_permits_at_five_per_period_span_three_refills() {
        let limiter = limiter(5);
        let start = Instant::now();

        for _ in 0..20 {
            limiter.acquire().await.unwrap();
        }

        // 5 permits at t=0, then refills at 1s, 2s and 3s.
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_times_out_when_bucket_stays_empty() {
        let limiter = RateLimiter::new(
            1,
            Duration::from_secs(60),
            Duration::from_millis(100),
        );

        limiter.acquire().await.unwrap();
        let err = limiter.acquire().await.unwrap_err();

        assert!(matches!(err, RateLimitError::AcquireTimeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_bucket() {
        let limiter = std::sync::Arc::new(limiter(5));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move { limiter.acquire().await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // 10 permits from a 5/period bucket need exactly one refill.
        assert!(start.elapsed() >= Duration::from_secs(1));
    }
}
