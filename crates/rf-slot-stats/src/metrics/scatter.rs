//! Free-form payout metrics (scatters, wilds, bonus and super symbols)

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use super::payline::{MAX_COUNT, PayoutTally};
use crate::error::StatsResult;

/// Payout histogram decimals for scatter-style payouts
pub const SCATTER_DECIMALS: u8 = 2;

/// Payout metrics of payouts not tied to a payline
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterAccumulator {
    tally: PayoutTally,
}

impl ScatterAccumulator {
    pub fn new(max_symbol: u16) -> Self {
        Self {
            tally: PayoutTally::new(SCATTER_DECIMALS, max_symbol, MAX_COUNT + 1),
        }
    }

    /// Resize for a symbol set and zero all data
    pub fn set_max_symbol(&mut self, max_symbol: u16) {
        self.tally.set_max_symbol(max_symbol);
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

impl Default for ScatterAccumulator {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Serialize for ScatterAccumulator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("ScatterPayout", 5)?;
        self.tally.serialize_fields(&mut st, "symbolLengths")?;
        st.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatsError;

    #[test]
    fn test_wild_payouts() {
        let mut wilds = ScatterAccumulator::new(11);
        wilds.increase(11, 4, 5.5).unwrap();
        wilds.increase(10, 3, 2.0).unwrap();

        let t = wilds.tally();
        assert_eq!(wilds.count(), 2);
        assert!((t.payouts.total() - 7.5).abs() < 1e-9);
        assert_eq!(t.symbols[11], 1);
        assert_eq!(t.symbols[10], 1);
        assert_eq!(t.payouts.decimals(), SCATTER_DECIMALS);
    }

    #[test]
    fn test_large_counts() {
        let mut s = ScatterAccumulator::new(3);
        s.increase(2, 45, 100.0).unwrap();
        assert_eq!(s.tally().lengths.get(45), 1);

        let mut other = ScatterAccumulator::new(3);
        other.merge(&s).unwrap();
        assert_eq!(other.tally().symbol_lengths[2].get(45), 1);
    }

    #[test]
    fn test_set_max_symbol_resets() {
        let mut s = ScatterAccumulator::new(3);
        s.increase(3, 3, 1.0).unwrap();
        s.set_max_symbol(8);
        assert_eq!(s.count(), 0);
        assert_eq!(s.tally().symbols.len(), 9);
        assert_eq!(s.tally().max_symbol(), 8);

        let small = ScatterAccumulator::new(3);
        assert!(matches!(s.merge(&small), Err(StatsError::ConfigMismatch { .. })));
    }

    #[test]
    fn test_serialize_names() {
        let mut s = ScatterAccumulator::new(1);
        s.increase(1, 3, 0.25).unwrap();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["symbolLengths"][1], serde_json::json!([0, 0, 0, 1]));
        assert!(json.get("symbolsX").is_none());
        assert_eq!(json["payouts"]["counts"]["0.25"], 1);

        let empty = serde_json::to_value(ScatterAccumulator::new(1)).unwrap();
        assert!(empty.get("count").is_none());
        assert!(empty.get("lengths").is_none());
    }
}
