//! Payline payout metrics
//!
//! [`PayoutTally`] is the shared core of payline and scatter accumulators:
//! payout count, payout histogram, per-symbol counts and matched-length
//! histograms (global and per symbol).

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use super::histogram::FloatHistogram;
use crate::error::{StatsError, StatsResult};
use crate::grow::GrowVec;

/// Most reels a payline can span
pub const MAX_REELS: usize = 15;

/// Most symbols a scatter-style payout can match
pub const MAX_COUNT: usize = 49;

/// Starting capacity of each per-symbol length histogram
pub const SYMBOL_LENGTH_CAPACITY: usize = MAX_COUNT + 1;

/// Payout histogram decimals for paylines
pub const PAYLINE_DECIMALS: u8 = 1;

/// Counters shared by payline and scatter accumulators
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutTally {
    /// Number of payouts
    pub count: u64,
    /// Payout factors
    pub payouts: FloatHistogram,
    /// Payouts per symbol id (`max_symbol + 1` slots)
    pub symbols: Vec<u64>,
    /// Payouts per matched length
    pub lengths: GrowVec,
    /// Payouts per matched length, per symbol id
    pub symbol_lengths: Vec<GrowVec>,
    length_capacity: usize,
}

impl PayoutTally {
    pub fn new(decimals: u8, max_symbol: u16, length_capacity: usize) -> Self {
        let mut t = Self {
            count: 0,
            payouts: FloatHistogram::with_decimals(decimals),
            symbols: Vec::new(),
            lengths: GrowVec::with_capacity(length_capacity),
            symbol_lengths: Vec::new(),
            length_capacity,
        };
        t.set_max_symbol(max_symbol);
        t
    }

    /// Resize for a symbol set and zero all data
    pub fn set_max_symbol(&mut self, max_symbol: u16) {
        let m = max_symbol as usize + 1;
        self.reset();
        self.symbols.resize(m, 0);
        self.symbol_lengths
            .resize_with(m, || GrowVec::with_capacity(SYMBOL_LENGTH_CAPACITY));
    }

    /// Highest symbol id this tally accepts
    pub fn max_symbol(&self) -> usize {
        self.symbols.len().saturating_sub(1)
    }

    /// Record one payout of `symbol` over `count` matched positions
    pub fn increase(&mut self, symbol: u16, count: u8, payout: f64) -> StatsResult<()> {
        let ix = symbol as usize;
        if ix >= self.symbols.len() {
            return Err(StatsError::unconfigured("payout symbol", symbol));
        }

        self.count += 1;
        self.payouts.increase(payout);
        self.symbols[ix] += 1;
        self.lengths.increment(count as usize);
        self.symbol_lengths[ix].increment(count as usize);
        Ok(())
    }

    pub fn merge(&mut self, other: &Self) -> StatsResult<()> {
        StatsError::check("payout symbol count", self.symbols.len(), other.symbols.len())?;
        if other.lengths.len() > self.lengths.capacity() {
            return Err(StatsError::mismatch(
                "payout length capacity",
                self.lengths.capacity(),
                other.lengths.len(),
            ));
        }

        self.payouts.merge(&other.payouts)?;
        self.lengths.absorb(&other.lengths);
        self.count += other.count;

        for (a, b) in self.symbols.iter_mut().zip(&other.symbols) {
            *a += b;
        }
        for (a, b) in self.symbol_lengths.iter_mut().zip(&other.symbol_lengths) {
            a.absorb(b);
        }
        Ok(())
    }

    /// Zero all data, keeping sizing
    pub fn reset(&mut self) {
        self.count = 0;
        self.payouts.reset();
        self.symbols.fill(0);
        self.lengths.clear();
        for l in &mut self.symbol_lengths {
            l.clear();
        }
    }

    /// Starting capacity of the length histogram
    pub fn length_capacity(&self) -> usize {
        self.length_capacity
    }

    pub(crate) fn serialize_fields<S: SerializeStruct>(&self, st: &mut S, symbol_lengths: &'static str) -> Result<(), S::Error> {
        if self.count == 0 {
            st.skip_field("count")?;
        } else {
            st.serialize_field("count", &self.count)?;
        }
        st.serialize_field("payouts", &self.payouts)?;
        if self.symbols.is_empty() {
            st.skip_field("symbols")?;
        } else {
            st.serialize_field("symbols", &self.symbols)?;
        }
        if self.lengths.is_empty() {
            st.skip_field("lengths")?;
        } else {
            st.serialize_field("lengths", &self.lengths)?;
        }
        if self.symbol_lengths.is_empty() {
            st.skip_field(symbol_lengths)
        } else {
            st.serialize_field(symbol_lengths, &self.symbol_lengths)
        }
    }
}

/// Payout metrics of one payline
///
/// The row map is fixed at creation and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct PaylineAccumulator {
    id: i32,
    row_map: Vec<u8>,
    tally: PayoutTally,
}

impl PaylineAccumulator {
    pub fn new(id: i32, max_symbol: u16, row_map: &[u8]) -> Self {
        Self {
            id,
            row_map: row_map.to_vec(),
            tally: PayoutTally::new(PAYLINE_DECIMALS, max_symbol, MAX_REELS + 1),
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    /// Row index per reel
    pub fn row_map(&self) -> &[u8] {
        &self.row_map
    }

    pub fn tally(&self) -> &PayoutTally {
        &self.tally
    }

    pub fn count(&self) -> u64 {
        self.tally.count
    }

    pub fn increase(&mut self, symbol: u16, count: u8, payout: f64) -> StatsResult<()> {
        self.tally.increase(symbol, count, payout)
    }

    pub fn merge(&mut self, other: &Self) -> StatsResult<()> {
        self.tally.merge(&other.tally)
    }

    pub fn reset(&mut self) {
        self.tally.reset();
    }
}

impl Serialize for PaylineAccumulator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("Payline", 7)?;
        if self.id == 0 {
            st.skip_field("id")?;
        } else {
            st.serialize_field("id", &self.id)?;
        }
        if self.row_map.is_empty() {
            st.skip_field("rowMap")?;
        } else {
            st.serialize_field("rowMap", &self.row_map)?;
        }
        self.tally.serialize_fields(&mut st, "symbolsX")?;
        st.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increase() {
        let mut p = PaylineAccumulator::new(1, 12, &[1, 1, 1, 1, 1]);
        p.increase(4, 3, 1.0).unwrap();
        p.increase(4, 5, 10.0).unwrap();
        p.increase(7, 3, 0.5).unwrap();

        let t = p.tally();
        assert_eq!(p.count(), 3);
        assert_eq!(t.symbols.len(), 13);
        assert_eq!(t.symbols[4], 2);
        assert_eq!(t.lengths.as_slice(), &[0, 0, 0, 2, 0, 1]);
        assert_eq!(t.symbol_lengths[4].get(5), 1);
        assert_eq!(t.symbol_lengths[7].get(3), 1);
        assert!((t.payouts.total() - 11.5).abs() < 1e-9);
        assert_eq!(p.row_map(), &[1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_increase_unknown_symbol() {
        let mut p = PaylineAccumulator::new(2, 5, &[0, 0, 0]);
        assert!(matches!(
            p.increase(6, 3, 1.0),
            Err(StatsError::UnconfiguredReference { id: 6, .. })
        ));
        assert_eq!(p.count(), 0);
    }

    #[test]
    fn test_lengths_grow_past_capacity() {
        let mut t = PayoutTally::new(2, 3, 4);
        t.increase(1, 20, 1.0).unwrap();
        assert_eq!(t.lengths.len(), 21);
        assert_eq!(t.lengths.capacity(), 21);
    }

    #[test]
    fn test_merge() {
        let mut a = PaylineAccumulator::new(1, 12, &[1, 1, 1]);
        a.increase(4, 3, 1.0).unwrap();
        let mut b = PaylineAccumulator::new(1, 12, &[1, 1, 1]);
        b.increase(4, 4, 2.0).unwrap();
        b.increase(9, 3, 1.0).unwrap();

        a.merge(&b).unwrap();
        let t = a.tally();
        assert_eq!(t.count, 3);
        assert_eq!(t.symbols[4], 2);
        assert_eq!(t.symbols[9], 1);
        assert_eq!(t.lengths.as_slice(), &[0, 0, 0, 2, 1]);
        assert_eq!(t.symbol_lengths[4].as_slice(), &[0, 0, 0, 1, 1]);
        assert_eq!(t.payouts.count(), 3);
    }

    #[test]
    fn test_merge_mismatch() {
        let mut a = PaylineAccumulator::new(1, 12, &[1, 1, 1]);
        let b = PaylineAccumulator::new(1, 11, &[1, 1, 1]);
        assert!(matches!(a.merge(&b), Err(StatsError::ConfigMismatch { left: 13, right: 12, .. })));

        let mut c = PayoutTally::new(1, 12, 4);
        let mut d = PayoutTally::new(1, 12, 16);
        d.increase(4, 9, 1.0).unwrap();
        assert!(matches!(c.merge(&d), Err(StatsError::ConfigMismatch { .. })));
        assert_eq!(c.count, 0);
    }

    #[test]
    fn test_clone_equals_reset() {
        let mut p = PaylineAccumulator::new(3, 8, &[2, 2, 2]);
        assert_eq!(p.clone(), p);
        p.increase(2, 3, 4.0).unwrap();
        assert_eq!(p.clone(), p);
        p.reset();
        assert_eq!(p, PaylineAccumulator::new(3, 8, &[2, 2, 2]));
    }

    #[test]
    fn test_serialize() {
        let mut p = PaylineAccumulator::new(1, 2, &[0, 1, 0]);
        p.increase(2, 3, 1.5).unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["count"], 1);
        assert_eq!(json["rowMap"], serde_json::json!([0, 1, 0]));
        assert_eq!(json["symbols"], serde_json::json!([0, 0, 1]));
        assert_eq!(json["lengths"], serde_json::json!([0, 0, 0, 1]));
        assert_eq!(json["symbolsX"][2], serde_json::json!([0, 0, 0, 1]));
        assert_eq!(json["payouts"]["counts"]["1.50"], 1);
    }
}
