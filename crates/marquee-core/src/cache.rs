//! Time-to-live memoization.

use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// A value computed on demand and kept for `ttl` after it was computed.
#[derive(Debug, Clone)]
pub struct TtlCache<T> {
    value: Option<(T, Instant)>,
    ttl: Duration,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { value: None, ttl }
    }

    /// Whether a cached value exists and is younger than the TTL at `now`.
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.value
            .as_ref()
            .is_some_and(|(_, at)| now.saturating_duration_since(*at) < self.ttl)
    }

    /// Return the cached value, recomputing it with `compute` when stale.
    pub fn get_or_insert_with(&mut self, now: Instant, compute: impl FnOnce() -> T) -> &T {
        if !self.is_fresh(now) {
            self.value = None;
        }
        &self.value.get_or_insert_with(|| (compute(), now)).0
    }

    /// Drop the cached value.
    pub fn invalidate(&mut self) {
        self.value = None;
    }

    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recomputes_after_ttl() {
        let start = Instant::now();
        let mut cache = TtlCache::new(Duration::from_millis(80));
        let mut calls = 0;

        assert_eq!(*cache.get_or_insert_with(start, || { calls += 1; calls }), 1);
        assert_eq!(
            *cache.get_or_insert_with(start + Duration::from_millis(79), || { calls += 1; calls }),
            1
        );
        assert_eq!(
            *cache.get_or_insert_with(start + Duration::from_millis(80), || { calls += 1; calls }),
            2
        );
    }

    #[test]
    fn test_invalidate() {
        let now = Instant::now();
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.get_or_insert_with(now, || 1);
        assert!(cache.is_fresh(now));

        cache.invalidate();
        assert!(!cache.is_fresh(now));
        assert_eq!(*cache.get_or_insert_with(now, || 2), 2);
    }

    #[test]
    fn test_zero_ttl_never_fresh() {
        let now = Instant::now();
        let mut cache = TtlCache::new(Duration::ZERO);
        cache.get_or_insert_with(now, || 1);
        assert!(!cache.is_fresh(now));
    }
}
