//! Token bucket per provider (`spec.md` §5: "the aggregator implements a
//! token bucket per provider; on provider rate-limit error it surfaces a
//! typed `RateLimited{resetAt}` to the caller"). Mirrors the shape of the
//! teacher's per-tenant `RateLimiter` in `agent-a2a/src/middleware/rate_limit.rs`,
//! swapping its sliding window for a refilling bucket since GitHub's own
//! limit resets on a fixed cadence rather than a rolling one.

use chrono::{DateTime, Duration, Utc};
use errors::ProviderError;
use std::collections::HashMap;
use tokio::sync::Mutex;

struct Bucket {
    tokens: f64,
    last_refill: DateTime<Utc>,
}

/// One bucket per provider key (e.g. an org login), refilling at a fixed
/// rate up to `capacity`.
pub struct RateLimiter {
    capacity: f64,
    refill_per_second: f64,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(capacity: f64, refill_per_second: f64) -> Self {
        Self { capacity, refill_per_second, buckets: Mutex::new(HashMap::new()) }
    }

    /// GitHub's default REST quota, refilling over the hour.
    #[must_use]
    pub fn github_default() -> Self {
        Self::new(5000.0, 5000.0 / 3600.0)
    }

    /// Consumes one token for `key`. Fails with `ProviderError::RateLimited`
    /// when the bucket is empty; `reset_at` is the instant it next holds a
    /// full token.
    pub async fn acquire(&self, key: &str, now: DateTime<Utc>) -> Result<(), ProviderError> {
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets.entry(key.to_string()).or_insert_with(|| Bucket { tokens: self.capacity, last_refill: now });

        let elapsed_secs = (now - bucket.last_refill).num_milliseconds().max(0) as f64 / 1000.0;
        bucket.tokens = (bucket.tokens + elapsed_secs * self.refill_per_second).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens < 1.0 {
            let seconds_to_next_token = (1.0 - bucket.tokens) / self.refill_per_second;
            let reset_at = now + Duration::milliseconds((seconds_to_next_token * 1000.0) as i64);
            return Err(ProviderError::RateLimited { reset_at });
        }
        bucket.tokens -= 1.0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exhausted_bucket_reports_rate_limited_with_a_reset_time() {
        let limiter = RateLimiter::new(2.0, 1.0);
        let now = Utc::now();
        limiter.acquire("acme", now).await.unwrap();
        limiter.acquire("acme", now).await.unwrap();
        let err = limiter.acquire("acme", now).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn bucket_refills_over_time() {
        let limiter = RateLimiter::new(1.0, 1.0);
        let now = Utc::now();
        limiter.acquire("acme", now).await.unwrap();
        assert!(limiter.acquire("acme", now).await.is_err());
        let later = now + Duration::seconds(2);
        assert!(limiter.acquire("acme", later).await.is_ok());
    }

    #[tokio::test]
    async fn separate_providers_have_independent_buckets() {
        let limiter = RateLimiter::new(1.0, 0.001);
        let now = Utc::now();
        limiter.acquire("acme", now).await.unwrap();
        assert!(limiter.acquire("other-org", now).await.is_ok());
    }
}
