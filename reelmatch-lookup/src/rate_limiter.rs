//! Token bucket for outbound lookup requests
//!
//! The bucket starts full, so the first `capacity` requests go out
//! immediately. A background task then deposits one token per refill period,
//! never holding more than `capacity`. Holding a [`RateToken`] is the only way
//! to send a search request.

use crate::LookupError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Permission to send one outbound request
///
/// Only [`TokenBucket::acquire`] creates tokens; the search client consumes
/// them by value.
#[derive(Debug)]
pub struct RateToken {
    _private: (),
}

/// Bounded token bucket with a background filler
pub struct TokenBucket {
    tokens: Arc<Semaphore>,
    capacity: usize,
    period: Duration,
    cancel: CancellationToken,
}

impl TokenBucket {
    /// Bucket refilled at `rate_per_second`, holding at most `capacity` tokens
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(rate_per_second: u32, capacity: usize) -> Self {
        Self::with_period(Duration::from_secs(1) / rate_per_second.max(1), capacity)
    }

    /// Bucket refilled with one token every `period`
    pub fn with_period(period: Duration, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let tokens = Arc::new(Semaphore::new(capacity));
        let cancel = CancellationToken::new();

        tokio::spawn(refill(
            Arc::clone(&tokens),
            capacity,
            period,
            cancel.clone(),
        ));

        debug!(capacity, period_ms = period.as_millis() as u64, "Token bucket started");
        Self {
            tokens,
            capacity,
            period,
            cancel,
        }
    }

    /// Wait for a token and take it
    pub async fn acquire(&self) -> Result<RateToken, LookupError> {
        let permit = self
            .tokens
            .acquire()
            .await
            .map_err(|_| LookupError::RateLimiterClosed)?;
        // Tokens are spent, not returned
        permit.forget();
        Ok(RateToken { _private: () })
    }

    /// Tokens currently in the bucket
    pub fn available(&self) -> usize {
        self.tokens.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Stop the filler and fail pending and future acquisitions
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.tokens.close();
    }
}

impl Drop for TokenBucket {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Deposit one token per tick until cancelled
///
/// This task is the only producer, so checking the count before adding keeps
/// the bucket at or below capacity.
async fn refill(tokens: Arc<Semaphore>, capacity: usize, period: Duration, cancel: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if tokens.available_permits() < capacity {
                    tokens.add_permits(1);
                }
            }
        }
    }
    debug!("Token bucket filler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(100);

    #[tokio::test]
    async fn test_initial_burst_then_refill_period() {
        let start = Instant::now();
        let bucket = TokenBucket::with_period(PERIOD, 3);

        for _ in 0..3 {
            bucket.acquire().await.unwrap();
        }
        assert!(start.elapsed() < PERIOD);
        assert_eq!(bucket.available(), 0);

        // Request B+1 waits for the first refill
        bucket.acquire().await.unwrap();
        assert!(start.elapsed() >= PERIOD);
    }

    #[tokio::test]
    async fn test_never_exceeds_capacity() {
        let bucket = TokenBucket::with_period(Duration::from_millis(10), 2);
        bucket.acquire().await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(bucket.available(), 2);
    }

    #[tokio::test]
    async fn test_rate_per_second_period() {
        let bucket = TokenBucket::new(9, 9);
        assert_eq!(bucket.capacity(), 9);
        assert_eq!(bucket.period(), Duration::from_secs(1) / 9);
        assert_eq!(bucket.available(), 9);
    }

    #[tokio::test]
    async fn test_shutdown_closes_bucket() {
        let bucket = TokenBucket::with_period(PERIOD, 1);
        bucket.shutdown();
        assert!(matches!(
            bucket.acquire().await,
            Err(LookupError::RateLimiterClosed)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_bucket() {
        let bucket = Arc::new(TokenBucket::with_period(Duration::from_millis(20), 2));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let bucket = Arc::clone(&bucket);
            handles.push(tokio::spawn(async move { bucket.acquire().await.map(|_| ()) }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Two tokens up front, two more need two refills
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
