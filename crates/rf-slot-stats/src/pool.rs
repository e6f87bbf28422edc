//! Typed free-list for aggregate reuse
//!
//! Aggregates own many small vectors and maps. Releasing one back to a
//! [`Pool`] clears it in place so the next acquire reuses those allocations
//! instead of building a fresh tree.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let pool = Pool::<PlayerRoundsAggregate>::default();
//! let stats = PlayerRoundsAggregate::acquire(&pool, &config)?;
//! // ... analyse rounds ...
//! stats.release(&pool);
//! ```

use parking_lot::Mutex;

/// Default number of idle instances a pool keeps
pub const DEFAULT_RETAINED: usize = 64;

/// Types that can be cleared for reuse
pub trait Recycle {
    /// Clear accumulated data and session sizing while keeping allocations
    fn recycle(&mut self);
}

/// Thread-safe free-list of recycled instances
///
/// Safe to acquire/release from independent threads. An acquired instance is
/// exclusively owned by the caller until released.
pub struct Pool<T> {
    free: Mutex<Vec<T>>,
    max_retained: usize,
}

impl<T: Recycle + Default> Pool<T> {
    /// Create a pool keeping at most `max_retained` idle instances
    pub fn new(max_retained: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_retained)),
            max_retained,
        }
    }

    /// Take a recycled instance, or a fresh one when the pool is empty
    pub fn acquire(&self) -> T {
        self.free.lock().pop().unwrap_or_default()
    }

    /// Clear `item` and keep it for the next acquire
    ///
    /// Instances beyond the retention limit are dropped.
    pub fn release(&self, mut item: T) {
        item.recycle();
        let mut free = self.free.lock();
        if free.len() < self.max_retained {
            free.push(item);
        }
    }

    /// Idle instances currently held
    pub fn len(&self) -> usize {
        self.free.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.lock().is_empty()
    }
}

impl<T: Recycle + Default> Default for Pool<T> {
    fn default() -> Self {
        Self::new(DEFAULT_RETAINED)
    }
}
