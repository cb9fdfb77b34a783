//! Trailing-edge coalescing for rapid-fire edits.
//!
//! Title keystrokes and map viewport drags produce a burst of edits; only
//! the last value of each burst should reach the store. A newer arrival
//! supersedes the pending one and restarts the quiet window. Already
//! dispatched requests are never cancelled.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Per-key trailing-edge debouncer. `now` is always passed in, keeping the
/// type deterministic under test.
#[derive(Debug)]
pub struct Debouncer<K, V> {
    window: Duration,
    pending: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash + Clone, V> Debouncer<K, V> {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Record a value for `key`, superseding any pending value and
    /// restarting its quiet window.
    pub fn push(&mut self, key: K, value: V, now: Instant) {
        self.pending.insert(key, (now, value));
    }

    /// Drain every entry whose quiet window has elapsed.
    pub fn ready(&mut self, now: Instant) -> Vec<(K, V)> {
        let window = self.window;
        let ready_keys: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, (since, _))| now.duration_since(*since) >= window)
            .map(|(key, _)| key.clone())
            .collect();
        ready_keys
            .into_iter()
            .filter_map(|key| self.pending.remove(&key).map(|(_, value)| (key, value)))
            .collect()
    }

    /// Drain everything immediately (session shutdown).
    pub fn flush(&mut self) -> Vec<(K, V)> {
        self.pending.drain().map(|(k, (_, v))| (k, v)).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Debouncer;
    use std::time::{Duration, Instant};

    const WINDOW: Duration = Duration::from_millis(500);

    #[test]
    fn fires_only_after_quiet_window() {
        let mut debouncer = Debouncer::new(WINDOW);
        let t0 = Instant::now();
        debouncer.push("title", "a", t0);

        assert!(debouncer.ready(t0 + Duration::from_millis(200)).is_empty());
        let fired = debouncer.ready(t0 + WINDOW);
        assert_eq!(fired, vec![("title", "a")]);
        assert!(debouncer.is_empty());
    }

    #[test]
    fn newer_arrival_supersedes_and_restarts_the_window() {
        let mut debouncer = Debouncer::new(WINDOW);
        let t0 = Instant::now();
        debouncer.push("title", "a", t0);
        debouncer.push("title", "ab", t0 + Duration::from_millis(300));

        // the original deadline passes without firing
        assert!(debouncer.ready(t0 + WINDOW).is_empty());

        let fired = debouncer.ready(t0 + Duration::from_millis(300) + WINDOW);
        assert_eq!(fired, vec![("title", "ab")]);
    }

    #[test]
    fn keys_debounce_independently() {
        let mut debouncer = Debouncer::new(WINDOW);
        let t0 = Instant::now();
        debouncer.push("title", "a", t0);
        debouncer.push("viewport", "b", t0 + Duration::from_millis(400));

        let first = debouncer.ready(t0 + WINDOW);
        assert_eq!(first, vec![("title", "a")]);
        assert!(!debouncer.is_empty());

        let second = debouncer.ready(t0 + Duration::from_millis(400) + WINDOW);
        assert_eq!(second, vec![("viewport", "b")]);
    }

    #[test]
    fn flush_drains_without_waiting() {
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.push("title", "a", Instant::now());
        assert_eq!(debouncer.flush(), vec![("title", "a")]);
        assert!(debouncer.is_empty());
    }
}
