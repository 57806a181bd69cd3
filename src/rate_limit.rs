use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Counts failed attempts per key (login e-mail, user id for TOTP codes)
/// inside a fixed window. Successful attempts are never counted.
pub struct AttemptLimiter {
    /// key -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
    max_failures: u32,
    window: Duration,
}

impl AttemptLimiter {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_failures,
            window,
        }
    }

    /// 5 failed passwords per e-mail per 15 minutes.
    pub fn for_logins() -> Self {
        Self::new(5, Duration::from_secs(15 * 60))
    }

    /// 5 wrong codes per account per 5 minutes.
    pub fn for_totp_codes() -> Self {
        Self::new(5, Duration::from_secs(5 * 60))
    }

    /// Ok, or the seconds left until the window resets.
    /// Does not count anything; call `record_failure()` for that.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let now = Instant::now();

        let Some(entry) = self.entries.get(&key.to_lowercase()) else {
            return Ok(());
        };
        let (count, start) = entry.value();

        if now.duration_since(*start) > self.window {
            return Ok(());
        }

        if *count >= self.max_failures {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(self.window.as_secs().saturating_sub(elapsed));
        }

        Ok(())
    }

    pub fn record_failure(&self, key: &str) {
        let now = Instant::now();

        let mut entry = self.entries.entry(key.to_lowercase()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > self.window {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    pub fn reset(&self, key: &str) {
        self.entries.remove(&key.to_lowercase());
    }

    /// Drop entries whose window has passed.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let window = self.window;
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) <= window);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
