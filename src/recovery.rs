use crate::config::CameraConfig;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Retry strategy for opening devices at startup
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Double the delay after every failed attempt
    pub exponential_backoff: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            exponential_backoff: true,
        }
    }
}

impl RetryPolicy {
    pub fn from_camera_config(config: &CameraConfig) -> Self {
        Self {
            max_attempts: config.open_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_delay_ms),
            max_delay: Duration::from_millis(config.max_retry_delay_ms),
            exponential_backoff: true,
        }
    }

    /// Delay after the `retry_count`-th failed attempt (0-based)
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        if !self.exponential_backoff {
            return self.base_delay;
        }

        let factor = 2_u32.saturating_pow(retry_count);
        let delay = self.base_delay.saturating_mul(factor);

        if delay > self.max_delay {
            self.max_delay
        } else {
            delay
        }
    }

    /// Run `attempt` until it succeeds or the attempt budget is spent.
    /// Returns the last error when every attempt failed.
    pub async fn run<T, E, F, Fut>(&self, component: &str, mut attempt: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt_no = 1;
        loop {
            match attempt(attempt_no).await {
                Ok(value) => {
                    if attempt_no > 1 {
                        info!("{} recovered on attempt {}", component, attempt_no);
                    }
                    return Ok(value);
                }
                Err(e) if attempt_no < self.max_attempts => {
                    let delay = self.delay_for(attempt_no - 1);
                    warn!(
                        "{} attempt {}/{} failed: {}; retrying in {:?}",
                        component, attempt_no, self.max_attempts, e, delay
                    );
                    sleep(delay).await;
                    attempt_no += 1;
                }
                Err(e) => {
                    warn!(
                        "{} attempt {}/{} failed: {}; giving up",
                        component, attempt_no, self.max_attempts, e
                    );
                    return Err(e);
                }
            }
        }
    }
}

/// Counts consecutive frame misses and signals when a stalled camera should
/// be reopened.
#[derive(Debug, Clone)]
pub struct MissTracker {
    threshold: u32,
    consecutive: u32,
}

impl MissTracker {
    /// `threshold == 0` disables reopen requests
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive: 0,
        }
    }

    /// Record a miss. Returns true when the miss count reaches the threshold;
    /// the counter then starts over so the next reopen is requested only
    /// after another full stall.
    pub fn record_miss(&mut self) -> bool {
        self.consecutive += 1;
        if self.threshold > 0 && self.consecutive >= self.threshold {
            debug!("{} consecutive frame misses", self.consecutive);
            self.consecutive = 0;
            return true;
        }
        false
    }

    pub fn record_frame(&mut self) {
        if self.consecutive > 0 {
            debug!("Frame received after {} misses", self.consecutive);
        }
        self.consecutive = 0;
    }

    pub fn consecutive_misses(&self) -> u32 {
        self.consecutive
    }
}
