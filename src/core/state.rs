//! Process-scoped worker pool.
//!
//! All minifiers built without an explicit pool share one. It is created on
//! first use and torn down by dropping the [`PoolGuard`] the binary holds for
//! the duration of a run; the next request after that gets a fresh pool.

use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use tracing::debug;

use crate::worker::{WorkerPool, default_slots};

lazy_static! {
    static ref SHARED_POOL: Mutex<Option<Arc<WorkerPool>>> = Mutex::new(None);
}

/// The shared pool, created with default sizing if none exists yet.
pub fn shared_pool() -> Arc<WorkerPool> {
    let mut slot = match SHARED_POOL.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    slot.get_or_insert_with(|| Arc::new(WorkerPool::new(default_slots())))
        .clone()
}

/// Replaces the shared pool with one of `slots` slots, shutting down the old one.
pub fn install_shared_pool(slots: usize) -> Arc<WorkerPool> {
    let pool = Arc::new(WorkerPool::new(slots));
    let previous = {
        let mut slot = match SHARED_POOL.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.replace(pool.clone())
    };
    if let Some(previous) = previous {
        previous.shutdown();
    }
    debug!("Shared worker pool sized to {} slots", pool.slots());
    pool
}

/// Shuts the shared pool down. Calling it with no pool alive is a no-op.
pub fn shutdown_shared_pool() {
    let pool = {
        let mut slot = match SHARED_POOL.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.take()
    };
    if let Some(pool) = pool {
        pool.shutdown();
    }
}

/// Tears down the shared pool when dropped.
///
/// Hold one for the lifetime of the process' work.
#[must_use = "the shared pool is shut down as soon as the guard is dropped"]
pub struct PoolGuard {
    pool: Arc<WorkerPool>,
}

impl PoolGuard {
    /// Guard over the shared pool, optionally resizing it first.
    pub fn acquire(slots: Option<usize>) -> Self {
        let pool = match slots {
            Some(slots) => install_shared_pool(slots),
            None => shared_pool(),
        };
        Self { pool }
    }

    pub fn pool(&self) -> Arc<WorkerPool> {
        self.pool.clone()
    }
}

impl Drop for PoolGuard {
    fn drop(&mut self) {
        self.pool.shutdown();
        shutdown_shared_pool();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_is_safe_to_repeat() {
        shutdown_shared_pool();
        shutdown_shared_pool();
    }

    #[test]
    fn guard_releases_its_pool() {
        let guard = PoolGuard::acquire(Some(2));
        let pool = guard.pool();
        assert_eq!(pool.slots(), 2);
        drop(guard);
        assert!(pool.is_shut_down());
    }
}
