//! Named async locks
//!
//! One FIFO mutex per object key, created on first use. An entry leaves the
//! registry as soon as nobody holds or waits for it, so the registry only
//! ever contains keys with operations in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Registry = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Registry of named locks
#[derive(Clone, Default)]
pub struct NamedLocks {
    registry: Registry,
}

impl NamedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `name`
    ///
    /// Waiters are served in the order they called `acquire`. Cancelling the
    /// returned future gives up the place in line.
    pub async fn acquire(&self, name: &str) -> NamedLockGuard {
        let lock = {
            let mut map = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(map.entry(name.to_string()).or_default())
        };

        // Created before waiting so an abandoned wait still cleans up.
        let handle = LockHandle {
            name: name.to_string(),
            lock: Some(Arc::clone(&lock)),
            registry: Arc::clone(&self.registry),
        };

        let guard = lock.lock_owned().await;

        NamedLockGuard {
            guard: Some(guard),
            _handle: handle,
        }
    }

    /// Number of names currently held or waited on
    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for NamedLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedLocks")
            .field("active", &self.len())
            .finish()
    }
}

struct LockHandle {
    name: String,
    lock: Option<Arc<AsyncMutex<()>>>,
    registry: Registry,
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        // Release our reference first so the count below only sees the
        // registry's own copy plus other holders and waiters.
        drop(self.lock.take());

        let mut map = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = map.get(&self.name) {
            if Arc::strong_count(entry) == 1 {
                map.remove(&self.name);
            }
        }
    }
}

/// Exclusive access to one name; released on drop
pub struct NamedLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    _handle: LockHandle,
}

impl NamedLockGuard {
    pub fn name(&self) -> &str {
        &self._handle.name
    }
}

impl Drop for NamedLockGuard {
    fn drop(&mut self) {
        // Unlock before the handle checks whether the entry can go.
        drop(self.guard.take());
    }
}

impl std::fmt::Debug for NamedLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedLockGuard")
            .field("name", &self.name())
            .finish()
    }
}
