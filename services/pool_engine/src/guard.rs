//! Per-thread reentrancy guard
//!
//! A mutating call registers its pool key before taking the pool's write
//! lock. If code running inside that call (an event sink, typically) calls
//! back into the engine for the same pool on the same thread, the second
//! registration fails instead of deadlocking on the lock.

use std::cell::RefCell;
use std::collections::HashSet;
use swap_amm::{AmmError, PoolKey};

thread_local! {
    static ACTIVE: RefCell<HashSet<PoolKey>> = RefCell::new(HashSet::new());
}

/// Marks `key` as in-flight on this thread until dropped
#[derive(Debug)]
pub struct ReentrancyGuard {
    key: PoolKey,
}

impl ReentrancyGuard {
    pub fn enter(key: PoolKey) -> Result<Self, AmmError> {
        let inserted = ACTIVE.with(|active| active.borrow_mut().insert(key));
        if !inserted {
            return Err(AmmError::ReentrancyGuardReentrantCall);
        }
        Ok(Self { key })
    }

    /// True while a mutating call on `key` is running on this thread
    pub fn is_active(key: &PoolKey) -> bool {
        ACTIVE.with(|active| active.borrow().contains(key))
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            active.borrow_mut().remove(&self.key);
        });
    }
}
