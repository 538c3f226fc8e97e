//! Per-key cancelable timers for debounced commits.
//!
//! Each key holds at most one pending value. Scheduling the same key again
//! replaces the value and restarts its timer, so a burst of keystrokes on
//! one field commits once, with the last value. Different keys are
//! independent.
//!
//! The debouncer never reads the clock itself: callers pass `now` to
//! [`Debouncer::schedule`] and [`Debouncer::poll`]. Identical input sequences
//! therefore produce identical commits.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Pending<V> {
    value: V,
    deadline: Instant,
    /// Scheduling order, used to break deadline ties.
    seq: u64,
}

/// A set of independent, restartable timers keyed by `K`.
#[derive(Debug, Clone)]
pub struct Debouncer<K: Ord, V> {
    pending: BTreeMap<K, Pending<V>>,
    next_seq: u64,
}

impl<K: Ord, V> Default for Debouncer<K, V> {
    fn default() -> Self {
        Self {
            pending: BTreeMap::new(),
            next_seq: 0,
        }
    }
}

impl<K: Ord + Clone, V> Debouncer<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the timer for `key`. Returns `true` if a pending
    /// value was replaced.
    pub fn schedule(&mut self, key: K, value: V, delay: Duration, now: Instant) -> bool {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending
            .insert(
                key,
                Pending {
                    value,
                    deadline: now + delay,
                    seq,
                },
            )
            .is_some()
    }

    /// Cancel the timer for `key`, returning its pending value.
    pub fn cancel(&mut self, key: &K) -> Option<V> {
        self.pending.remove(key).map(|p| p.value)
    }

    /// Cancel every pending timer. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    /// Remove and return every entry whose deadline is at or before `now`,
    /// ordered by deadline, then by scheduling order.
    pub fn poll(&mut self, now: Instant) -> Vec<(K, V, Instant)> {
        let due: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(k, _)| k.clone())
            .collect();

        let mut fired: Vec<(K, Pending<V>)> = due
            .into_iter()
            .filter_map(|k| self.pending.remove(&k).map(|p| (k, p)))
            .collect();
        fired.sort_by(|a, b| (a.1.deadline, a.1.seq).cmp(&(b.1.deadline, b.1.seq)));

        fired.into_iter().map(|(k, p)| (k, p.value, p.deadline)).collect()
    }

    /// Remove and return everything pending, regardless of deadline, in
    /// deadline order.
    pub fn drain(&mut self) -> Vec<(K, V, Instant)> {
        let mut all: Vec<(K, Pending<V>)> = std::mem::take(&mut self.pending).into_iter().collect();
        all.sort_by(|a, b| (a.1.deadline, a.1.seq).cmp(&(b.1.deadline, b.1.seq)));
        all.into_iter().map(|(k, p)| (k, p.value, p.deadline)).collect()
    }

    /// Earliest pending deadline, for hosts that sleep until the next tick.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn peek(&self, key: &K) -> Option<&V> {
        self.pending.get(key).map(|p| &p.value)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_fires_after_quiet_period() {
        let t0 = Instant::now();
        let mut d: Debouncer<&str, i32> = Debouncer::new();
        d.schedule("a", 1, ms(150), t0);

        assert!(d.poll(t0 + ms(149)).is_empty());
        let fired = d.poll(t0 + ms(150));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].1, 1);
        assert!(d.is_empty());
    }

    #[test]
    fn test_restart_keeps_last_value() {
        let t0 = Instant::now();
        let mut d: Debouncer<&str, i32> = Debouncer::new();
        assert!(!d.schedule("a", 1, ms(150), t0));
        assert!(d.schedule("a", 12, ms(150), t0 + ms(100)));

        // Original deadline passed, but the timer was restarted.
        assert!(d.poll(t0 + ms(200)).is_empty());
        let fired = d.poll(t0 + ms(250));
        assert_eq!(fired, vec![("a", 12, t0 + ms(250))]);
    }

    #[test]
    fn test_keys_are_independent() {
        let t0 = Instant::now();
        let mut d: Debouncer<&str, i32> = Debouncer::new();
        d.schedule("notes", 1, ms(300), t0);
        d.schedule("depth", 2, ms(150), t0 + ms(10));

        let fired = d.poll(t0 + ms(200));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, "depth");
        assert!(d.is_pending(&"notes"));
        assert_eq!(d.next_deadline(), Some(t0 + ms(300)));
    }

    #[test]
    fn test_poll_orders_by_deadline() {
        let t0 = Instant::now();
        let mut d: Debouncer<&str, i32> = Debouncer::new();
        d.schedule("z", 1, ms(50), t0);
        d.schedule("a", 2, ms(100), t0);
        d.schedule("m", 3, ms(50), t0);

        let keys: Vec<&str> = d.poll(t0 + ms(100)).into_iter().map(|(k, _, _)| k).collect();
        assert_eq!(keys, vec!["z", "m", "a"]);
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut d: Debouncer<u8, &str> = Debouncer::new();
        d.schedule(1, "x", ms(10), t0);
        d.schedule(2, "y", ms(10), t0);

        assert_eq!(d.cancel(&1), Some("x"));
        assert_eq!(d.cancel(&1), None);
        assert_eq!(d.cancel_all(), 1);
        assert!(d.poll(t0 + ms(1000)).is_empty());
    }

    #[test]
    fn test_drain_ignores_deadlines() {
        let t0 = Instant::now();
        let mut d: Debouncer<u8, u8> = Debouncer::new();
        d.schedule(1, 10, ms(300), t0);
        d.schedule(2, 20, ms(150), t0);
        let drained: Vec<u8> = d.drain().into_iter().map(|(_, v, _)| v).collect();
        assert_eq!(drained, vec![20, 10]);
        assert!(d.is_empty());
    }
}
