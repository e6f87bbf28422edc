//! Grow-on-write counter vectors
//!
//! Counters indexed by an observed quantity (matched length, spins per round).
//! The starting capacity is a sizing hint, not a ceiling: writing past the end
//! extends the vector with zeroes.

use serde::{Serialize, Serializer};

use crate::error::{StatsError, StatsResult};

/// Counter vector that grows to include any index written to
#[derive(Debug, Clone, Default)]
pub struct GrowVec {
    items: Vec<u64>,
    start_capacity: usize,
}

impl GrowVec {
    /// Create an empty vector with room for `capacity` slots
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            start_capacity: capacity,
        }
    }

    /// Add one at `ix`
    #[inline]
    pub fn increment(&mut self, ix: usize) {
        self.add(ix, 1);
    }

    /// Add `n` at `ix`, growing as needed
    #[inline]
    pub fn add(&mut self, ix: usize, n: u64) {
        if ix >= self.items.len() {
            self.items.resize(ix + 1, 0);
        }
        self.items[ix] += n;
    }

    /// Counter at `ix` (zero past the end)
    pub fn get(&self, ix: usize) -> u64 {
        self.items.get(ix).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Slots this vector accepts from a merge peer
    ///
    /// The larger of the starting capacity and whatever growth already happened.
    pub fn capacity(&self) -> usize {
        self.start_capacity.max(self.items.len())
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.items
    }

    /// Sum of all counters
    pub fn sum(&self) -> u64 {
        self.items.iter().sum()
    }

    /// Add the peer's counters, growing to the peer's length
    pub fn absorb(&mut self, other: &GrowVec) {
        if other.items.len() > self.items.len() {
            self.items.resize(other.items.len(), 0);
        }
        for (a, b) in self.items.iter_mut().zip(&other.items) {
            *a += b;
        }
    }

    /// Add the peer's counters, refusing peers longer than this vector's capacity
    pub fn merge(&mut self, what: &'static str, other: &GrowVec) -> StatsResult<()> {
        if other.len() > self.capacity() {
            return Err(StatsError::mismatch(what, self.capacity(), other.len()));
        }
        self.absorb(other);
        Ok(())
    }

    /// Drop all counters, keeping the allocation
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl PartialEq for GrowVec {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Serialize for GrowVec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grows_on_write() {
        let mut v = GrowVec::with_capacity(4);
        assert!(v.is_empty());
        assert_eq!(v.capacity(), 4);

        v.increment(2);
        v.add(9, 3);
        assert_eq!(v.len(), 10);
        assert_eq!(v.get(2), 1);
        assert_eq!(v.get(9), 3);
        assert_eq!(v.get(100), 0);
        assert_eq!(v.capacity(), 10);
        assert_eq!(v.sum(), 4);
    }

    #[test]
    fn test_merge_respects_capacity() {
        let mut a = GrowVec::with_capacity(3);
        a.increment(1);

        let mut b = GrowVec::with_capacity(3);
        b.increment(2);
        a.merge("lengths", &b).unwrap();
        assert_eq!(a.as_slice(), &[0, 1, 1]);

        let mut c = GrowVec::with_capacity(8);
        c.increment(6);
        assert!(matches!(
            a.merge("lengths", &c),
            Err(StatsError::ConfigMismatch { left: 3, right: 7, .. })
        ));
    }

    #[test]
    fn test_clear_keeps_capacity_hint() {
        let mut v = GrowVec::with_capacity(16);
        v.increment(20);
        v.clear();
        assert!(v.is_empty());
        assert_eq!(v.capacity(), 16);
        assert_eq!(v, GrowVec::with_capacity(2));
    }

    #[test]
    fn test_serializes_as_sequence() {
        let mut v = GrowVec::with_capacity(2);
        v.add(1, 5);
        assert_eq!(serde_json::to_string(&v).unwrap(), "[0,5]");
    }
}
