use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// In-memory sliding-window rate limiter, keyed by an arbitrary string
/// (the login handler keys on the submitted email).
pub struct RateLimiter {
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
    max_attempts: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window_secs: u64) -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            max_attempts,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Returns true while the key is under its attempt limit.
    pub fn check(&self, key: &str) -> bool {
        let mut attempts = self.attempts.lock().unwrap();
        let now = Instant::now();

        let entry = attempts.entry(key.to_string()).or_default();
        entry.retain(|&time| now.duration_since(time) < self.window);

        entry.len() < self.max_attempts
    }

    /// Record a failed attempt for a key.
    pub fn record(&self, key: &str) {
        let mut attempts = self.attempts.lock().unwrap();
        let now = Instant::now();

        let entry = attempts.entry(key.to_string()).or_default();
        entry.retain(|&time| now.duration_since(time) < self.window);
        entry.push(now);
    }

    /// Forget all attempts for a key, e.g. after a successful login.
    pub fn clear(&self, key: &str) {
        let mut attempts = self.attempts.lock().unwrap();
        attempts.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_under_limit() {
        let limiter = RateLimiter::new(3, 60);

        assert!(limiter.check("a@example.com"));
        limiter.record("a@example.com");
        limiter.record("a@example.com");
        assert!(limiter.check("a@example.com"));
    }

    #[test]
    fn test_blocks_over_limit() {
        let limiter = RateLimiter::new(2, 60);

        limiter.record("a@example.com");
        limiter.record("a@example.com");
        assert!(!limiter.check("a@example.com"));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, 60);

        limiter.record("a@example.com");
        assert!(!limiter.check("a@example.com"));
        assert!(limiter.check("b@example.com"));
    }

    #[test]
    fn test_clear_resets_key() {
        let limiter = RateLimiter::new(2, 60);

        limiter.record("a@example.com");
        limiter.record("a@example.com");
        assert!(!limiter.check("a@example.com"));

        limiter.clear("a@example.com");
        assert!(limiter.check("a@example.com"));
    }
}
