//! Count/total/min/max trackers with a value histogram
//!
//! [`Histogram`] is generic over the sample type:
//!
//! - [`IntHistogram`] (`i64`): bets, wins, round flag values
//! - [`CountHistogram`] (`u64`): spin counts, milestones, wheel segments
//! - [`FloatHistogram`] (`f64`): payout factors, bucketed at a fixed number of decimals
//!
//! `min` tracks the smallest *positive* value seen. It stays at zero while
//! every observation is zero, so "never saw a positive value" remains visible.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::Hash;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::error::{StatsError, StatsResult};

/// Initial bucket capacity of a histogram
pub const BUCKET_CAPACITY: usize = 32;

/// Value type a [`Histogram`] can track
pub trait Sample: Copy + PartialOrd + Default + fmt::Debug + Serialize {
    /// Bucket key
    type Key: Copy + Eq + Hash + fmt::Debug;

    fn accumulate(self, other: Self) -> Self;

    /// Bucket key of this value at the given scale factor
    fn to_key(self, factor: f64) -> Self::Key;

    /// Wire label of a bucket key
    fn key_label(key: Self::Key, factor: f64) -> String;

    /// Equality at the given scale factor
    fn same(self, other: Self, factor: f64) -> bool;

    fn as_f64(self) -> f64;
}

impl Sample for i64 {
    type Key = i64;

    #[inline]
    fn accumulate(self, other: Self) -> Self {
        self + other
    }

    #[inline]
    fn to_key(self, _factor: f64) -> i64 {
        self
    }

    fn key_label(key: i64, _factor: f64) -> String {
        key.to_string()
    }

    fn same(self, other: Self, _factor: f64) -> bool {
        self == other
    }

    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Sample for u64 {
    type Key = u64;

    #[inline]
    fn accumulate(self, other: Self) -> Self {
        self + other
    }

    #[inline]
    fn to_key(self, _factor: f64) -> u64 {
        self
    }

    fn key_label(key: u64, _factor: f64) -> String {
        key.to_string()
    }

    fn same(self, other: Self, _factor: f64) -> bool {
        self == other
    }

    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Sample for f64 {
    type Key = i64;

    #[inline]
    fn accumulate(self, other: Self) -> Self {
        self + other
    }

    #[inline]
    fn to_key(self, factor: f64) -> i64 {
        (factor * self).round() as i64
    }

    fn key_label(key: i64, factor: f64) -> String {
        format!("{:.2}", key as f64 / factor)
    }

    fn same(self, other: Self, factor: f64) -> bool {
        self.to_key(factor) == other.to_key(factor)
    }

    fn as_f64(self) -> f64 {
        self
    }
}

/// Count, total, min/max and value histogram of a metric
#[derive(Debug, Clone)]
pub struct Histogram<V: Sample> {
    observed: bool,
    decimals: u8,
    factor: f64,
    count: u64,
    total: V,
    min: V,
    max: V,
    keys: Vec<V::Key>,
    counts: HashMap<V::Key, u64>,
}

/// Signed integer histogram
pub type IntHistogram = Histogram<i64>;
/// Unsigned counter histogram
pub type CountHistogram = Histogram<u64>;
/// Decimal-scaled float histogram
pub type FloatHistogram = Histogram<f64>;

impl<V: Sample> Histogram<V> {
    /// Create an empty histogram
    pub fn new() -> Self {
        Self::scaled(0)
    }

    fn scaled(decimals: u8) -> Self {
        Self {
            observed: false,
            decimals,
            factor: 10f64.powi(decimals as i32),
            count: 0,
            total: V::default(),
            min: V::default(),
            max: V::default(),
            keys: Vec::with_capacity(BUCKET_CAPACITY),
            counts: HashMap::with_capacity(BUCKET_CAPACITY),
        }
    }

    /// Record one observation
    pub fn increase(&mut self, value: V) {
        self.count += 1;
        self.total = self.total.accumulate(value);

        if self.observed {
            let zero = V::default();
            if value > zero && (self.min == zero || value < self.min) {
                self.min = value;
            }
            if value > self.max {
                self.max = value;
            }
        } else {
            self.min = value;
            self.max = value;
            self.observed = true;
        }

        self.bump(value.to_key(self.factor), 1);
    }

    fn bump(&mut self, key: V::Key, n: u64) {
        match self.counts.entry(key) {
            Entry::Occupied(mut e) => *e.get_mut() += n,
            Entry::Vacant(e) => {
                e.insert(n);
                self.keys.push(key);
            }
        }
    }

    /// Fold `other` into this histogram
    pub fn merge(&mut self, other: &Self) -> StatsResult<()> {
        StatsError::check("histogram decimals", self.decimals as usize, other.decimals as usize)?;

        self.count += other.count;
        self.total = self.total.accumulate(other.total);

        if self.observed {
            let zero = V::default();
            if other.min > zero && (self.min == zero || other.min < self.min) {
                self.min = other.min;
            }
            if other.max > self.max {
                self.max = other.max;
            }
        } else {
            self.min = other.min;
            self.max = other.max;
            self.observed = other.observed;
        }

        for key in &other.keys {
            if let Some(&n) = other.counts.get(key) {
                self.bump(*key, n);
            }
        }

        Ok(())
    }

    /// Zero all data, keeping the scale and allocations
    pub fn reset(&mut self) {
        self.observed = false;
        self.count = 0;
        self.total = V::default();
        self.min = V::default();
        self.max = V::default();
        self.keys.clear();
        self.counts.clear();
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn total(&self) -> V {
        self.total
    }

    /// Smallest positive value seen (zero if none)
    pub fn min(&self) -> V {
        self.min
    }

    pub fn max(&self) -> V {
        self.max
    }

    /// Has anything been recorded yet?
    pub fn has_observed(&self) -> bool {
        self.observed
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Occurrences of `value` (after scaling)
    pub fn get(&self, value: V) -> u64 {
        self.counts.get(&value.to_key(self.factor)).copied().unwrap_or(0)
    }

    /// Buckets in first-seen order
    pub fn buckets(&self) -> impl Iterator<Item = (V::Key, u64)> + '_ {
        self.keys
            .iter()
            .map(|k| (*k, self.counts.get(k).copied().unwrap_or(0)))
    }

    /// Number of distinct buckets
    pub fn bucket_count(&self) -> usize {
        self.counts.len()
    }

    /// Mean of the recorded values
    pub fn mean(&self) -> f64 {
        if self.count > 0 {
            self.total.as_f64() / self.count as f64
        } else {
            0.0
        }
    }
}

impl Histogram<f64> {
    /// Create a float histogram bucketed at `decimals` decimals
    pub fn with_decimals(decimals: u8) -> Self {
        Self::scaled(decimals)
    }
}

impl Histogram<u64> {
    /// Advance a pure counter by one
    ///
    /// Keeps a single bucket for the current total instead of one per step.
    pub fn increase_one(&mut self) {
        if self.observed {
            let old = self.total;
            self.counts.remove(&old);
            self.keys.retain(|k| *k != old);
        } else {
            self.count = 1;
            self.observed = true;
        }

        self.total += 1;
        self.min += 1;
        self.max += 1;
        self.bump(self.total, 1);
    }
}

impl<V: Sample> Default for Histogram<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Sample> PartialEq for Histogram<V> {
    fn eq(&self, other: &Self) -> bool {
        self.observed == other.observed
            && self.count == other.count
            && self.total.same(other.total, self.factor)
            && self.min.same(other.min, self.factor)
            && self.max.same(other.max, self.factor)
            && self.counts == other.counts
    }
}

struct Buckets<'a, V: Sample>(&'a Histogram<V>);

impl<V: Sample> Serialize for Buckets<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let h = self.0;
        serializer.collect_map(h.buckets().map(|(k, n)| (V::key_label(k, h.factor), n)))
    }
}

impl<V: Sample> Serialize for Histogram<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let zero = V::default();
        let mut st = serializer.serialize_struct("Histogram", 5)?;
        st.serialize_field("count", &self.count)?;
        st.serialize_field("total", &self.total)?;
        if self.min == zero {
            st.skip_field("min")?;
        } else {
            st.serialize_field("min", &self.min)?;
        }
        if self.max == zero {
            st.skip_field("max")?;
        } else {
            st.serialize_field("max", &self.max)?;
        }
        if self.keys.is_empty() {
            st.skip_field("counts")?;
        } else {
            st.serialize_field("counts", &Buckets(self))?;
        }
        st.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_ignores_zero() {
        let mut h = IntHistogram::new();
        for _ in 0..5 {
            h.increase(0);
        }
        assert!(h.has_observed());
        assert_eq!(h.min(), 0);
        assert_eq!(h.max(), 0);

        h.increase(7);
        assert_eq!(h.min(), 7);
        assert_eq!(h.max(), 7);

        h.increase(3);
        h.increase(0);
        assert_eq!(h.min(), 3);
        assert_eq!(h.max(), 7);
        assert_eq!(h.count(), 8);
        assert_eq!(h.get(0), 6);
    }

    #[test]
    fn test_first_observation_sets_min_max() {
        let mut h = IntHistogram::new();
        h.increase(-4);
        assert_eq!(h.min(), -4);
        assert_eq!(h.max(), -4);

        // a negative first minimum is never replaced by positive values
        h.increase(2);
        assert_eq!(h.min(), -4);
        assert_eq!(h.max(), 2);
    }

    #[test]
    fn test_count_and_total_match_buckets() {
        let mut h = IntHistogram::new();
        for v in [5, 1, 5, 9, 0, 5, 1] {
            h.increase(v);
        }

        let count: u64 = h.buckets().map(|(_, n)| n).sum();
        let total: i64 = h.buckets().map(|(k, n)| k * n as i64).sum();
        assert_eq!(h.count(), count);
        assert_eq!(h.total(), total);

        let keys: Vec<i64> = h.buckets().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![5, 1, 9, 0]);
        assert_eq!(h.bucket_count(), 4);
    }

    #[test]
    fn test_float_buckets() {
        let mut h = FloatHistogram::with_decimals(1);
        h.increase(1.04);
        h.increase(0.96);
        h.increase(2.5);

        assert_eq!(h.count(), 3);
        assert_eq!(h.get(1.0), 2);
        assert_eq!(h.get(2.5), 1);
        assert!((h.total() - 4.5).abs() < 1e-9);
        assert_eq!(h.min(), 0.96);
        assert_eq!(h.max(), 2.5);
    }

    #[test]
    fn test_increase_one() {
        let mut h = CountHistogram::new();
        h.increase_one();
        h.increase_one();
        h.increase_one();

        assert_eq!(h.count(), 1);
        assert_eq!(h.total(), 3);
        assert_eq!(h.min(), 3);
        assert_eq!(h.max(), 3);
        assert_eq!(h.bucket_count(), 1);
        assert_eq!(h.get(3), 1);
        assert_eq!(h.buckets().count(), 1);
    }

    #[test]
    fn test_merge() {
        let mut a = IntHistogram::new();
        a.increase(0);
        a.increase(4);

        let mut b = IntHistogram::new();
        b.increase(2);
        b.increase(4);
        b.increase(10);

        a.merge(&b).unwrap();
        assert_eq!(a.count(), 5);
        assert_eq!(a.total(), 20);
        assert_eq!(a.min(), 2);
        assert_eq!(a.max(), 10);
        assert_eq!(a.get(4), 2);
        assert_eq!(a.get(0), 1);
    }

    #[test]
    fn test_merge_into_empty_adopts_peer() {
        let mut a = IntHistogram::new();
        let mut b = IntHistogram::new();
        b.increase(-3);

        a.merge(&b).unwrap();
        assert!(a.has_observed());
        assert_eq!(a.min(), -3);
        assert_eq!(a.max(), -3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_merge_positive_into_zero_only() {
        let mut a = IntHistogram::new();
        a.increase(0);
        let mut b = IntHistogram::new();
        b.increase(6);

        a.merge(&b).unwrap();
        assert_eq!(a.min(), 6);
        assert_eq!(a.max(), 6);
    }

    #[test]
    fn test_merge_is_commutative_on_totals() {
        let mut a = IntHistogram::new();
        let mut b = IntHistogram::new();
        for v in [1, 2, 3] {
            a.increase(v);
        }
        for v in [3, 4] {
            b.increase(v);
        }

        let mut ab = a.clone();
        ab.merge(&b).unwrap();
        let mut ba = b.clone();
        ba.merge(&a).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_merge_decimals_mismatch() {
        let mut a = FloatHistogram::with_decimals(1);
        let b = FloatHistogram::with_decimals(2);
        assert!(matches!(
            a.merge(&b),
            Err(StatsError::ConfigMismatch { left: 1, right: 2, .. })
        ));
    }

    #[test]
    fn test_clone_equals_and_reset() {
        let mut h = FloatHistogram::with_decimals(2);
        assert_eq!(h.clone(), h);

        h.increase(1.25);
        h.increase(0.0);
        assert_eq!(h.clone(), h);

        h.reset();
        assert_eq!(h, FloatHistogram::with_decimals(2));
        assert_eq!(h.decimals(), 2);
    }

    #[test]
    fn test_serialize_sparse() {
        let h = IntHistogram::new();
        assert_eq!(serde_json::to_string(&h).unwrap(), r#"{"count":0,"total":0}"#);

        let mut f = FloatHistogram::with_decimals(1);
        f.increase(2.5);
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["min"], 2.5);
        assert_eq!(json["counts"]["2.50"], 1);
    }
}
