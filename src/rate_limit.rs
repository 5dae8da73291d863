use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

const WINDOW_SECS: u64 = 15 * 60;
const GENERAL_LIMIT: u32 = 100;
const AUTH_FAILURE_LIMIT: u32 = 5;

/// Per-IP request limiter using a sliding window (100 requests / 15 min).
pub struct GeneralRateLimiter {
    /// ip -> (count, window_start)
    entries: DashMap<IpAddr, (u32, Instant)>,
}

impl GeneralRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check if a request is allowed. Returns Ok(()) or Err with retry-after seconds.
    pub fn check(&self, ip: IpAddr) -> Result<(), u64> {
        let window = Duration::from_secs(WINDOW_SECS);
        let now = Instant::now();

        let mut entry = self.entries.entry(ip).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > window {
            *count = 1;
            *start = now;
            return Ok(());
        }

        if *count >= GENERAL_LIMIT {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(WINDOW_SECS.saturating_sub(elapsed));
        }

        *count += 1;
        Ok(())
    }

    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }
}

impl Default for GeneralRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-IP credential brute force limiter: 5 failed attempts per 15 minutes.
pub struct AuthRateLimiter {
    /// ip -> (failed_count, window_start)
    entries: DashMap<IpAddr, (u32, Instant)>,
}

impl AuthRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check if an auth attempt is allowed.
    /// Does NOT increment the counter — call `record_failure()` on a failed attempt.
    pub fn check(&self, ip: IpAddr) -> Result<(), u64> {
        let window = Duration::from_secs(WINDOW_SECS);
        let now = Instant::now();

        let entry = self.entries.get(&ip);
        let Some(entry) = entry else {
            return Ok(());
        };

        let (count, start) = entry.value();

        if now.duration_since(*start) > window {
            return Ok(());
        }

        if *count >= AUTH_FAILURE_LIMIT {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(WINDOW_SECS.saturating_sub(elapsed));
        }

        Ok(())
    }

    /// Record a failed login or registration attempt for the given IP.
    pub fn record_failure(&self, ip: IpAddr) {
        let window = Duration::from_secs(WINDOW_SECS);
        let now = Instant::now();

        let mut entry = self.entries.entry(ip).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > window {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }
}

impl Default for AuthRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    #[test]
    fn general_limiter_allows_up_to_limit() {
        let limiter = GeneralRateLimiter::new();
        for _ in 0..GENERAL_LIMIT {
            assert!(limiter.check(ip(1)).is_ok());
        }
        assert!(limiter.check(ip(1)).is_err());
        // Other IPs unaffected
        assert!(limiter.check(ip(2)).is_ok());
    }

    #[test]
    fn auth_limiter_blocks_after_five_failures() {
        let limiter = AuthRateLimiter::new();
        assert!(limiter.check(ip(1)).is_ok());
        for _ in 0..AUTH_FAILURE_LIMIT {
            limiter.record_failure(ip(1));
        }
        assert!(limiter.check(ip(1)).is_err());
        assert!(limiter.check(ip(2)).is_ok());
    }

    #[test]
    fn auth_limiter_successes_do_not_count() {
        let limiter = AuthRateLimiter::new();
        for _ in 0..20 {
            assert!(limiter.check(ip(1)).is_ok());
        }
    }
}
