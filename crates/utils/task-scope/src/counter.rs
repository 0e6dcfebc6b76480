use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Shared counter whose observable value after N completed increments from
/// any number of concurrent callers equals the starting value plus N.
///
/// Both implementations below satisfy the contract; an unsynchronized
/// shared-integer strategy is deliberately not offered.
#[async_trait]
pub trait GuardedCounter: Send + Sync + 'static {
    /// Add one and return the new value.
    async fn increment(&self) -> u64;

    /// Current value.
    async fn get(&self) -> u64;
}

/// Lock-free strategy: hardware atomic read-modify-write.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicU64,
}

impl AtomicCounter {
    pub fn new(initial: u64) -> Self {
        Self {
            value: AtomicU64::new(initial),
        }
    }
}

#[async_trait]
impl GuardedCounter for AtomicCounter {
    async fn increment(&self) -> u64 {
        // Pure counting, no ordering dependency on other memory.
        self.value.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Mutual-exclusion strategy: the lock is held across the whole
/// read-modify-write.
#[derive(Debug, Default)]
pub struct MutexCounter {
    value: Mutex<u64>,
}

impl MutexCounter {
    pub fn new(initial: u64) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }
}

#[async_trait]
impl GuardedCounter for MutexCounter {
    async fn increment(&self) -> u64 {
        let mut value = self.value.lock().await;
        *value += 1;
        *value
    }

    async fn get(&self) -> u64 {
        *self.value.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_atomic_counter_sequential() {
        let counter = AtomicCounter::new(40);
        assert_eq!(counter.increment().await, 41);
        assert_eq!(counter.increment().await, 42);
        assert_eq!(counter.get().await, 42);
    }

    #[tokio::test]
    async fn test_mutex_counter_sequential() {
        let counter = MutexCounter::new(0);
        assert_eq!(counter.increment().await, 1);
        assert_eq!(counter.get().await, 1);
    }

    #[tokio::test]
    async fn test_zero_increments() {
        let counter = AtomicCounter::new(7);
        assert_eq!(counter.get().await, 7);
    }
}
