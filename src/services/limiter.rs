use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Bounds how many items are in flight against the generation capability.
///
/// Capacity is fixed at construction. Waiters are admitted in FIFO order as
/// slots free up.
#[derive(Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A held slot. The slot is returned when the permit is dropped, on every
/// exit path of the holder.
#[derive(Debug)]
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct SlotPermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    /// Create a limiter with `capacity` slots (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait until a slot is free and take it.
    pub async fn acquire(&self) -> Result<SlotPermit, LimiterError> {
        let permit = self.semaphore.clone().acquire_owned().await?;
        metrics::gauge!("batch_items_in_flight").increment(1.0);
        Ok(SlotPermit { _permit: permit })
    }
}

impl SlotPermit {
    /// Return the slot now instead of at end of scope.
    pub fn release(self) {}
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        metrics::gauge!("batch_items_in_flight").decrement(1.0);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LimiterError {
    #[error("concurrency limiter closed")]
    Closed(#[from] AcquireError),
}
