//! Sliding-window call rate governor shared through [`AppState`](crate::state::AppState).

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// How long an idle key survives before [`RateLimiter::cleanup`] drops it.
const IDLE_EVICTION: Duration = Duration::from_secs(60);

/// Window settings for one class of operation.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiterConfig {
    /// Calls allowed inside the window.
    pub max_calls: usize,
    /// Length of the sliding window.
    pub window: Duration,
}

/// One fetch of the event configuration per five seconds.
pub const CONFIG_FETCH: RateLimiterConfig = RateLimiterConfig {
    max_calls: 1,
    window: Duration::from_millis(5000),
};

/// One prediction submission per three seconds.
pub const SUBMIT_PREDICTION: RateLimiterConfig = RateLimiterConfig {
    max_calls: 1,
    window: Duration::from_millis(3000),
};

/// General read traffic, five calls per ten seconds.
pub const GENERAL_FETCH: RateLimiterConfig = RateLimiterConfig {
    max_calls: 5,
    window: Duration::from_millis(10_000),
};

/// Sliding-window limiter tracking call timestamps per key.
#[derive(Debug, Default)]
pub struct RateLimiter {
    calls: DashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    /// Create an empty limiter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call under `key` if the window still has room.
    ///
    /// Returns `false` without recording when the limit is exhausted, so a
    /// denied call does not extend the caller's own lockout.
    pub fn is_allowed(&self, key: &str, config: &RateLimiterConfig) -> bool {
        let now = Instant::now();
        let mut entry = self.calls.entry(key.to_owned()).or_default();

        entry.retain(|at| now.duration_since(*at) < config.window);

        if entry.len() >= config.max_calls {
            return false;
        }

        entry.push(now);
        true
    }

    /// Drop keys whose last recorded call is older than the eviction horizon.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.calls.retain(|_, timestamps| {
            timestamps
                .last()
                .is_some_and(|at| now.duration_since(*at) < IDLE_EVICTION)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burst_config() -> RateLimiterConfig {
        RateLimiterConfig {
            max_calls: 2,
            window: Duration::from_millis(50),
        }
    }

    #[test]
    fn allows_until_window_is_full() {
        let limiter = RateLimiter::new();
        let config = burst_config();

        assert!(limiter.is_allowed("guest", &config));
        assert!(limiter.is_allowed("guest", &config));
        assert!(!limiter.is_allowed("guest", &config));
    }

    #[test]
    fn window_expiry_frees_the_key() {
        let limiter = RateLimiter::new();
        let config = RateLimiterConfig {
            max_calls: 1,
            window: Duration::from_millis(20),
        };

        assert!(limiter.is_allowed("guest", &config));
        assert!(!limiter.is_allowed("guest", &config));

        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.is_allowed("guest", &config));
    }

    #[test]
    fn denied_calls_do_not_extend_the_lockout() {
        let limiter = RateLimiter::new();
        let config = RateLimiterConfig {
            max_calls: 1,
            window: Duration::from_millis(40),
        };

        assert!(limiter.is_allowed("guest", &config));
        for _ in 0..5 {
            assert!(!limiter.is_allowed("guest", &config));
        }

        std::thread::sleep(Duration::from_millis(50));
        assert!(limiter.is_allowed("guest", &config));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new();
        let config = RateLimiterConfig {
            max_calls: 1,
            window: Duration::from_secs(60),
        };

        assert!(limiter.is_allowed("config_fetch", &config));
        assert!(limiter.is_allowed("submit_prediction", &config));
        assert!(!limiter.is_allowed("config_fetch", &config));
    }

    #[test]
    fn cleanup_keeps_recent_keys() {
        let limiter = RateLimiter::new();
        let config = burst_config();

        assert!(limiter.is_allowed("guest", &config));
        limiter.cleanup();
        assert_eq!(limiter.calls.len(), 1);
    }
}
