//! Rate-limit aware retry with exponential backoff.

use crate::error::Error;
use log::*;
use rand::Rng;
use regex::Regex;
use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;

/// Retries allowed after the first attempt of an inference call.
pub const MAX_RETRIES: u32 = 2;

/// Upper bound on any single backoff sleep.
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Fraction of the computed delay added as random jitter, at most.
const JITTER_RATIO: f64 = 0.25;

fn retry_hint_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?i)retry (?:in|after) (\d+(?:\.\d+)?)\s*s").expect("valid hint pattern"),
            Regex::new(r#"(?i)"?retryDelay"?\s*:\s*"(\d+(?:\.\d+)?)s""#)
                .expect("valid hint pattern"),
        ]
    })
}

/// Parse a vendor-supplied "retry in 12.5s" / `"retryDelay": "12s"` hint from error text.
pub fn parse_retry_hint(message: &str) -> Option<Duration> {
    retry_hint_patterns().iter().find_map(|pattern| {
        pattern
            .captures(message)
            .and_then(|caps| caps.get(1))
            .and_then(|secs| secs.as_str().parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(Duration::from_secs_f64)
    })
}

/// Exponential backoff retry policy for rate-limited calls.
///
/// Only failures classified by [`Error::is_rate_limit`] are retried; every other
/// error is returned on the spot. Once the retries are spent the caller receives
/// [`Error::RateLimitExceeded`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl RetryPolicy {
    /// Create a policy with [`MAX_RETRIES`] and the given base delay.
    pub fn new(base_delay: Duration) -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: true,
        }
    }

    /// Lower the retry budget. Values above [`MAX_RETRIES`] are capped.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        if max_retries > MAX_RETRIES {
            warn!(
                "Requested {} retries, capping at {}",
                max_retries, MAX_RETRIES
            );
        }
        self.max_retries = max_retries.min(MAX_RETRIES);
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Disable random jitter, giving deterministic delays.
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Calculate the backoff delay before retry number `attempt + 1`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay.as_secs_f64() * 2_f64.powi(attempt as i32);
        let jittered = if self.jitter {
            exponential * (1.0 + rand::thread_rng().gen_range(0.0..JITTER_RATIO))
        } else {
            exponential
        };
        Duration::from_secs_f64(jittered.min(self.max_delay.as_secs_f64()))
    }

    /// Run `op`, retrying rate-limited failures with exponential backoff.
    pub async fn run<F, Fut, R>(&self, op: F) -> Result<R, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, Error>>,
    {
        self.run_with_hint(op, |_| None).await
    }

    /// Run `op` like [`RetryPolicy::run`], letting `hint` supply a precise delay
    /// for a given failure. A hint replaces the computed backoff, capped at the
    /// policy's maximum delay.
    pub async fn run_with_hint<F, Fut, R, H>(&self, mut op: F, hint: H) -> Result<R, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, Error>>,
        H: Fn(&Error) -> Option<Duration>,
    {
        let mut attempt = 0;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_rate_limit() {
                return Err(err);
            }

            if attempt >= self.max_retries {
                warn!(
                    "Rate limit persisted after {} retries: {}",
                    self.max_retries, err
                );
                return Err(Error::RateLimitExceeded);
            }

            let delay = hint(&err)
                .map(|d| d.min(self.max_delay))
                .unwrap_or_else(|| self.backoff_delay(attempt));
            info!(
                "Rate limited (attempt {}/{}), retrying in {:.1}s",
                attempt + 1,
                self.max_retries + 1,
                delay.as_secs_f64()
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}
