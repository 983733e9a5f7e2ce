//! In-flight guards for mutation entry points.
//!
//! [`KeyedLock`] covers per-row operations (one in-flight mutation per
//! entity id); [`OpFlag`] covers one-at-a-time operations. Both hand out
//! RAII guards so release cannot be forgotten on an early return.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// A set of keys with at most one holder per key.
///
/// `try_acquire` never blocks: a second request for a held key is refused,
/// which is exactly the "ignore the double-tap" semantic mutation entry
/// points need.
#[derive(Debug, Default)]
pub struct KeyedLock<K> {
    held: Mutex<HashSet<K>>,
}

impl<K: Eq + Hash + Clone> KeyedLock<K> {
    /// Create an empty lock set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
        }
    }

    /// Acquire the key, or return `None` if it is already held.
    #[must_use]
    pub fn try_acquire(&self, key: K) -> Option<KeyedGuard<'_, K>> {
        let mut held = lock_set(&self.held);
        if held.insert(key.clone()) {
            Some(KeyedGuard { lock: self, key })
        } else {
            None
        }
    }

    /// Whether the key is currently held.
    #[must_use]
    pub fn is_held(&self, key: &K) -> bool {
        lock_set(&self.held).contains(key)
    }

    /// Snapshot of all held keys, for spinner/disabled-state rendering.
    #[must_use]
    pub fn held_keys(&self) -> Vec<K> {
        lock_set(&self.held).iter().cloned().collect()
    }

    fn release(&self, key: &K) {
        lock_set(&self.held).remove(key);
    }
}

fn lock_set<K>(held: &Mutex<HashSet<K>>) -> std::sync::MutexGuard<'_, HashSet<K>> {
    held.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Guard for a key acquired from a [`KeyedLock`]. Releases on drop.
#[derive(Debug)]
pub struct KeyedGuard<'a, K: Eq + Hash + Clone> {
    lock: &'a KeyedLock<K>,
    key: K,
}

impl<K: Eq + Hash + Clone> Drop for KeyedGuard<'_, K> {
    fn drop(&mut self) {
        self.lock.release(&self.key);
    }
}

/// A single-operation in-flight flag with RAII release.
#[derive(Debug, Default)]
pub struct OpFlag {
    active: AtomicBool,
}

impl OpFlag {
    /// Create an inactive flag.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
        }
    }

    /// Set the flag, or return `None` if the operation is already running.
    #[must_use]
    pub fn try_begin(&self) -> Option<OpFlagGuard<'_>> {
        if self.active.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(OpFlagGuard { flag: self })
        }
    }

    /// Whether the operation is currently running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Guard for an [`OpFlag`]. Clears the flag on drop.
#[derive(Debug)]
pub struct OpFlagGuard<'a> {
    flag: &'a OpFlag,
}

impl Drop for OpFlagGuard<'_> {
    fn drop(&mut self) {
        self.flag.active.store(false, Ordering::SeqCst);
    }
}
