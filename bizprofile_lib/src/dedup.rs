//! Per-key async gate so that only one read for a given key is in flight.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Slot<V> = Arc<Mutex<Option<V>>>;

/// Hands out one async slot per key.
///
/// The first caller for a key proceeds and may [`GateGuard::publish`] its
/// result; callers queued behind it see that result through
/// [`GateGuard::shared`] instead of repeating the work. A key's slot is
/// dropped once nobody holds or waits on it, so the next caller starts fresh.
pub struct KeyedGate<V> {
    // Holder count is only changed under the shard lock.
    slots: DashMap<String, (usize, Slot<V>)>,
}

impl<V> Default for KeyedGate<V> {
    fn default() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }
}

impl<V> KeyedGate<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    pub async fn acquire(&self, key: &str) -> GateGuard<'_, V> {
        let slot = {
            let mut entry = self
                .slots
                .entry(key.to_string())
                .or_insert_with(|| (0, Arc::new(Mutex::new(None))));
            entry.0 += 1;
            Arc::clone(&entry.1)
        };
        let mut pending = GateGuard {
            gate: self,
            key: key.to_string(),
            guard: None,
        };
        pending.guard = Some(slot.lock_owned().await);
        pending
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Exclusive access to one key of a [`KeyedGate`].
pub struct GateGuard<'a, V> {
    gate: &'a KeyedGate<V>,
    key: String,
    guard: Option<OwnedMutexGuard<Option<V>>>,
}

impl<V> GateGuard<'_, V> {
    /// The value published by an earlier holder of this key, if any.
    pub fn shared(&self) -> Option<&V> {
        self.guard.as_ref().and_then(|g| (**g).as_ref())
    }

    /// Leaves `value` for the callers queued behind this one.
    pub fn publish(&mut self, value: V) {
        if let Some(g) = self.guard.as_mut() {
            **g = Some(value);
        }
    }
}

impl<V> Drop for GateGuard<'_, V> {
    fn drop(&mut self) {
        self.guard.take();
        self.gate.slots.remove_if_mut(&self.key, |_, entry| {
            entry.0 -= 1;
            entry.0 == 0
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_serialized() {
        let gate = Arc::new(KeyedGate::<()>::new());
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let gate = gate.clone();
            let active = active.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let _guard = gate.acquire("profile:a").await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert!(gate.is_empty());
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let gate = KeyedGate::<()>::new();
        let _a = gate.acquire("a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), gate.acquire("b")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn slots_are_released_after_use() {
        let gate = KeyedGate::<u32>::new();
        for i in 0..1000 {
            let mut guard = gate.acquire(&format!("profile:{i}")).await;
            guard.publish(i);
        }
        assert_eq!(gate.len(), 0);

        // A fresh caller does not see a value from a finished round.
        let guard = gate.acquire("profile:7").await;
        assert_eq!(guard.shared(), None);
    }

    #[tokio::test]
    async fn queued_callers_see_published_value() {
        let gate = Arc::new(KeyedGate::<String>::new());
        let mut leader = gate.acquire("profile:a").await;

        let follower = {
            let gate = gate.clone();
            tokio::spawn(async move {
                let guard = gate.acquire("profile:a").await;
                let seen = guard.shared().cloned();
                seen
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(gate.len(), 1);

        leader.publish("record".to_string());
        drop(leader);
        assert_eq!(follower.await.unwrap(), Some("record".to_string()));
        assert!(gate.is_empty());
    }

    #[tokio::test]
    async fn cancelled_waiter_does_not_leak() {
        let gate = KeyedGate::<()>::new();
        let held = gate.acquire("profile:a").await;
        let waited = tokio::time::timeout(Duration::from_millis(10), gate.acquire("profile:a")).await;
        assert!(waited.is_err());
        drop(held);
        assert!(gate.is_empty());
    }
}
