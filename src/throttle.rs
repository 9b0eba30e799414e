use crate::error::{ApiError, Result};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// A request rate such as `50/second` or `1000/day`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    pub requests: u32,
    pub period_secs: f64,
}

impl FromStr for Rate {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ApiError::Config(format!("invalid throttle rate '{s}'"));
        let (count, period) = s.split_once('/').ok_or_else(invalid)?;
        let requests: u32 = count.trim().parse().map_err(|_| invalid())?;
        // only the first letter of the period matters: s, m, h, d
        let period_secs = match period.trim().chars().next() {
            Some('s') => 1.0,
            Some('m') => 60.0,
            Some('h') => 3600.0,
            Some('d') => 86400.0,
            _ => return Err(invalid()),
        };
        if requests == 0 {
            return Err(invalid());
        }
        Ok(Self {
            requests,
            period_secs,
        })
    }
}

/// Per-key token buckets. Each key starts with a full bucket of
/// `rate.requests` tokens that refills continuously over the period.
#[derive(Debug, Clone)]
pub struct Throttle {
    rate: Rate,
    buckets: Arc<Mutex<HashMap<String, (f64, Instant)>>>,
}

impl Throttle {
    pub fn new(rate: Rate) -> Self {
        Self {
            rate,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Take one token for `key`; false when the bucket is empty
    pub async fn check(&self, key: &str) -> bool {
        let capacity = self.rate.requests as f64;
        let refill_rate = capacity / self.rate.period_secs;
        let now = Instant::now();

        let mut buckets = self.buckets.lock().await;
        let (tokens, last) = buckets
            .entry(key.to_string())
            .or_insert((capacity, now));
        let elapsed = now.duration_since(*last).as_secs_f64();
        *tokens = (*tokens + elapsed * refill_rate).min(capacity);
        *last = now;
        if *tokens >= 1.0 {
            *tokens -= 1.0;
            true
        } else {
            false
        }
    }
}
