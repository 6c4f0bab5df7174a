use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};

use tracing::trace;

/// Default number of requests allowed per [`DEFAULT_REFILL_PERIOD`].
pub const DEFAULT_CAPACITY: u32 = 28;

/// Default time it takes for an empty bucket to refill completely.
pub const DEFAULT_REFILL_PERIOD: Duration = Duration::from_secs(1);

/// A token bucket shared by every request going through the clients it is given to.
///
/// The bucket starts full with `capacity` tokens and refills continuously at a rate of
/// `capacity / refill_period`. Every request spends one token, whether it succeeds or not.
/// Tokens are never given back.
///
/// Cloning a `RateLimiter` gives a new handle to the same bucket. Pass a clone to
/// [`ClientBuilder::rate_limiter`] to make several clients share a single limit.
///
/// ```
/// # use nexusmods::client::RateLimiter;
/// use std::time::Duration;
///
/// // 100 requests every 30 seconds
/// let limiter = RateLimiter::new(100, Duration::from_secs(30));
/// assert_eq!(limiter.capacity(), 100);
/// ```
///
/// [`ClientBuilder::rate_limiter`]: super::ClientBuilder::rate_limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    capacity: u32,
    refill_period: Duration,
    // Use a tokio mutex for fairness and because waiting for a token can take a long time.
    bucket: Arc<Mutex<Bucket>>,
}

#[derive(Debug)]
struct Bucket {
    available: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant, capacity: f64, refill_period: Duration) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let refilled = elapsed.as_secs_f64() * capacity / refill_period.as_secs_f64();

        self.available = (self.available + refilled).min(capacity);
        self.last_refill = now;
    }
}

impl RateLimiter {
    /// Create a limiter admitting at most `capacity` requests per `refill_period`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or `refill_period` is zero.
    pub fn new(capacity: u32, refill_period: Duration) -> Self {
        assert!(capacity > 0, "rate limiter capacity must be positive");
        assert!(
            !refill_period.is_zero(),
            "rate limiter refill period must be positive"
        );

        RateLimiter {
            capacity,
            refill_period,
            bucket: Arc::new(Mutex::new(Bucket {
                available: f64::from(capacity),
                last_refill: Instant::now(),
            })),
        }
    }

    /// Maximum number of tokens the bucket can hold.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Time it takes for an empty bucket to refill completely.
    pub fn refill_period(&self) -> Duration {
        self.refill_period
    }

    /// Number of tokens currently in the bucket, including the fraction refilled since the last
    /// request.
    pub async fn available(&self) -> f64 {
        let mut bucket = self.bucket.lock().await;
        bucket.refill(Instant::now(), f64::from(self.capacity), self.refill_period);
        bucket.available
    }

    /// Wait until a token is available and take it.
    ///
    /// Dropping the returned future before it completes doesn't spend any token.
    pub async fn acquire(&self) {
        let capacity = f64::from(self.capacity);

        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                bucket.refill(Instant::now(), capacity, self.refill_period);

                if bucket.available >= 1.0 {
                    bucket.available -= 1.0;
                    return;
                }

                self.refill_period
                    .mul_f64((1.0 - bucket.available) / capacity)
            };

            trace!(?wait, "rate limit reached, waiting for a token");
            sleep(wait).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        RateLimiter::new(DEFAULT_CAPACITY, DEFAULT_REFILL_PERIOD)
    }
}
