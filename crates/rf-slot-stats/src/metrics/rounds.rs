//! Bet, win and spin-count metrics over a set of rounds
//!
//! One [`RoundsAggregate`] covers all rounds of a player, and one more is
//! kept per bonus category.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use super::histogram::{CountHistogram, IntHistogram};
use crate::error::{StatsError, StatsResult};
use crate::grow::GrowVec;
use crate::results::RoundResult;

/// Starting capacity of the spins-per-round vectors
pub const ROUND_SPINS_CAPACITY: usize = 32;

/// Symbol ids tracked for per-round usage (higher ids are ignored)
pub const USAGE_SLOTS: usize = 100;

/// Bet/win histograms, spin counts and symbol usage of a set of rounds
#[derive(Debug, Clone, PartialEq)]
pub struct RoundsAggregate {
    pub count: u64,
    pub bets: IntHistogram,
    pub bets_no_free: IntHistogram,
    pub bets_free: IntHistogram,
    pub wins: IntHistogram,
    pub wins_no_free: IntHistogram,
    pub wins_free: IntHistogram,
    pub free_spins: CountHistogram,
    pub refill_spins: CountHistogram,
    pub super_spins: CountHistogram,
    /// Rounds per number of free spins
    pub free_spin_rounds: GrowVec,
    /// Rounds per number of refill spins
    pub refill_rounds: GrowVec,
    /// Rounds per number of super spins
    pub super_rounds: GrowVec,
    /// Rounds in which each symbol appeared
    pub symbols_used: Vec<u64>,
    pub symbols_no_free: Vec<u64>,
    pub symbols_free: Vec<u64>,
}

impl RoundsAggregate {
    /// Create an aggregate tracking usage of `symbol_count` symbol ids
    pub fn new(symbol_count: usize) -> Self {
        let mut r = Self::default();
        r.configure(symbol_count);
        r
    }

    /// Zero all data and resize the symbol usage vectors
    pub fn configure(&mut self, symbol_count: usize) {
        self.reset();
        for v in [
            &mut self.symbols_used,
            &mut self.symbols_no_free,
            &mut self.symbols_free,
        ] {
            v.clear();
            v.resize(symbol_count, 0);
        }
    }

    /// Number of symbol ids tracked
    pub fn symbol_count(&self) -> usize {
        self.symbols_used.len()
    }

    /// Record one round
    pub fn new_round(
        &mut self,
        bet: i64,
        win: i64,
        free: u64,
        refill: u64,
        super_spins: u64,
        results: &[RoundResult],
    ) {
        self.count += 1;

        self.bets.increase(bet);
        self.wins.increase(win);
        if free > 0 {
            self.bets_free.increase(bet);
            self.wins_free.increase(win);
        } else {
            self.bets_no_free.increase(bet);
            self.wins_no_free.increase(win);
        }

        self.free_spins.increase(free);
        self.refill_spins.increase(refill);
        self.super_spins.increase(super_spins);

        self.free_spin_rounds.increment(free as usize);
        self.refill_rounds.increment(refill as usize);
        self.super_rounds.increment(super_spins as usize);

        let mut used = [false; USAGE_SLOTS];
        let mut has_free = false;
        for spin in results.iter().filter_map(RoundResult::as_spin) {
            has_free |= spin.kind.is_free();
            for &id in &spin.initial {
                if let Some(u) = used.get_mut(id as usize) {
                    *u = true;
                }
            }
        }

        // the free/no-free split reuses the symbols of the whole round
        let partition = if has_free {
            &mut self.symbols_free
        } else {
            &mut self.symbols_no_free
        };
        for (ix, _) in used.iter().enumerate().filter(|(_, u)| **u) {
            if ix < self.symbols_used.len() {
                self.symbols_used[ix] += 1;
                partition[ix] += 1;
            }
        }
    }

    pub fn merge(&mut self, other: &Self) -> StatsResult<()> {
        StatsError::check("rounds symbol count", self.symbol_count(), other.symbol_count())?;

        self.count += other.count;

        self.bets.merge(&other.bets)?;
        self.bets_no_free.merge(&other.bets_no_free)?;
        self.bets_free.merge(&other.bets_free)?;
        self.wins.merge(&other.wins)?;
        self.wins_no_free.merge(&other.wins_no_free)?;
        self.wins_free.merge(&other.wins_free)?;
        self.free_spins.merge(&other.free_spins)?;
        self.refill_spins.merge(&other.refill_spins)?;
        self.super_spins.merge(&other.super_spins)?;

        self.free_spin_rounds.absorb(&other.free_spin_rounds);
        self.refill_rounds.absorb(&other.refill_rounds);
        self.super_rounds.absorb(&other.super_rounds);

        add_assign(&mut self.symbols_used, &other.symbols_used);
        add_assign(&mut self.symbols_no_free, &other.symbols_no_free);
        add_assign(&mut self.symbols_free, &other.symbols_free);
        Ok(())
    }

    /// Zero all data, keeping sizing
    pub fn reset(&mut self) {
        self.count = 0;
        self.bets.reset();
        self.bets_no_free.reset();
        self.bets_free.reset();
        self.wins.reset();
        self.wins_no_free.reset();
        self.wins_free.reset();
        self.free_spins.reset();
        self.refill_spins.reset();
        self.super_spins.reset();
        self.free_spin_rounds.clear();
        self.refill_rounds.clear();
        self.super_rounds.clear();
        self.symbols_used.fill(0);
        self.symbols_no_free.fill(0);
        self.symbols_free.fill(0);
    }
}

fn add_assign(into: &mut [u64], from: &[u64]) {
    for (a, b) in into.iter_mut().zip(from) {
        *a += b;
    }
}

impl Default for RoundsAggregate {
    fn default() -> Self {
        Self {
            count: 0,
            bets: IntHistogram::new(),
            bets_no_free: IntHistogram::new(),
            bets_free: IntHistogram::new(),
            wins: IntHistogram::new(),
            wins_no_free: IntHistogram::new(),
            wins_free: IntHistogram::new(),
            free_spins: CountHistogram::new(),
            refill_spins: CountHistogram::new(),
            super_spins: CountHistogram::new(),
            free_spin_rounds: GrowVec::with_capacity(ROUND_SPINS_CAPACITY),
            refill_rounds: GrowVec::with_capacity(ROUND_SPINS_CAPACITY),
            super_rounds: GrowVec::with_capacity(ROUND_SPINS_CAPACITY),
            symbols_used: Vec::new(),
            symbols_no_free: Vec::new(),
            symbols_free: Vec::new(),
        }
    }
}

impl Serialize for RoundsAggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("Rounds", 16)?;
        st.serialize_field("count", &self.count)?;
        st.serialize_field("bets", &self.bets)?;
        st.serialize_field("betsNoFree", &self.bets_no_free)?;
        st.serialize_field("betsFree", &self.bets_free)?;
        st.serialize_field("wins", &self.wins)?;
        st.serialize_field("winsNoFree", &self.wins_no_free)?;
        st.serialize_field("winsFree", &self.wins_free)?;
        st.serialize_field("freeSpins", &self.free_spins)?;
        st.serialize_field("refillSpins", &self.refill_spins)?;
        st.serialize_field("superSpins", &self.super_spins)?;

        for (name, v) in [
            ("freeSpinRounds", &self.free_spin_rounds),
            ("refillRounds", &self.refill_rounds),
            ("superRounds", &self.super_rounds),
        ] {
            if v.is_empty() {
                st.skip_field(name)?;
            } else {
                st.serialize_field(name, v)?;
            }
        }

        for (name, v) in [
            ("symbolsUsed", &self.symbols_used),
            ("symbolsUsedWithoutFree", &self.symbols_no_free),
            ("symbolsUsedWithFree", &self.symbols_free),
        ] {
            if v.is_empty() {
                st.skip_field(name)?;
            } else {
                st.serialize_field(name, v)?;
            }
        }
        st.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{SpinKind, SpinResult};

    fn spin(kind: SpinKind, initial: Vec<u16>) -> RoundResult {
        RoundResult::spin(SpinResult::new(kind, initial), 0.0)
    }

    #[test]
    fn test_new_round_partitions() {
        let mut r = RoundsAggregate::new(6);
        r.new_round(100, 0, 0, 0, 0, &[spin(SpinKind::Regular, vec![1, 2, 2, 3])]);
        r.new_round(
            100,
            450,
            2,
            1,
            0,
            &[
                spin(SpinKind::First, vec![1, 4, 4]),
                spin(SpinKind::Free, vec![5, 5, 1]),
                spin(SpinKind::Free, vec![1, 1, 1]),
            ],
        );

        assert_eq!(r.count, 2);
        assert_eq!(r.bets.total(), 200);
        assert_eq!(r.bets_free.count(), 1);
        assert_eq!(r.wins_no_free.total(), 0);
        assert_eq!(r.wins_free.total(), 450);
        assert_eq!(r.free_spin_rounds.as_slice(), &[1, 0, 1]);
        assert_eq!(r.refill_rounds.as_slice(), &[1, 1]);
        assert_eq!(r.super_rounds.as_slice(), &[2]);

        assert_eq!(r.symbols_used, vec![0, 2, 1, 1, 1, 1]);
        // the whole free round counts, including its base spin symbols
        assert_eq!(r.symbols_free, vec![0, 1, 0, 0, 1, 1]);
        assert_eq!(r.symbols_no_free, vec![0, 1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_usage_ignores_out_of_range_ids() {
        let mut r = RoundsAggregate::new(3);
        r.new_round(1, 0, 0, 0, 0, &[spin(SpinKind::Regular, vec![1, 7, 150])]);
        assert_eq!(r.symbols_used, vec![0, 1, 0]);
    }

    #[test]
    fn test_spin_vectors_grow() {
        let mut r = RoundsAggregate::new(0);
        r.new_round(1, 0, 40, 0, 0, &[]);
        assert_eq!(r.free_spin_rounds.len(), 41);
        assert_eq!(r.free_spin_rounds.get(40), 1);
        assert_eq!(r.free_spins.max(), 40);
    }

    #[test]
    fn test_merge_shards() {
        let round = [spin(SpinKind::Regular, vec![1, 2])];
        let mut a = RoundsAggregate::new(4);
        let mut b = RoundsAggregate::new(4);
        for i in 0..100 {
            a.new_round(10, i % 3, 0, 0, 0, &round);
            b.new_round(20, 0, 1 + (i as u64 % 40), 0, 0, &round);
        }

        a.merge(&b).unwrap();
        assert_eq!(a.count, 200);
        assert_eq!(a.bets.total(), 100 * 10 + 100 * 20);
        assert_eq!(a.bets.count(), 200);
        assert_eq!(a.bets_free.total(), 2000);
        assert_eq!(a.free_spin_rounds.len(), 41);
        assert_eq!(a.free_spin_rounds.sum(), 200);
        assert_eq!(a.symbols_used[1], 200);
        // usage partitions follow spin kinds, not the free-spin count
        assert_eq!(a.symbols_no_free[2], 200);
        assert_eq!(a.symbols_free[2], 0);
    }

    #[test]
    fn test_merge_mismatch() {
        let mut a = RoundsAggregate::new(4);
        let b = RoundsAggregate::new(5);
        assert!(matches!(a.merge(&b), Err(StatsError::ConfigMismatch { left: 4, right: 5, .. })));
    }

    #[test]
    fn test_reset_and_clone() {
        let mut r = RoundsAggregate::new(3);
        r.new_round(5, 5, 1, 0, 0, &[spin(SpinKind::Free, vec![2])]);
        assert_eq!(r.clone(), r);
        r.reset();
        assert_eq!(r, RoundsAggregate::new(3));
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(RoundsAggregate::new(0)).unwrap();
        assert_eq!(json["count"], 0);
        assert_eq!(json["bets"]["count"], 0);
        assert!(json.get("freeSpinRounds").is_none());
        assert!(json.get("symbolsUsed").is_none());

        let mut r = RoundsAggregate::new(2);
        r.new_round(1, 0, 0, 0, 0, &[spin(SpinKind::Regular, vec![1])]);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["freeSpinRounds"], serde_json::json!([1]));
        assert_eq!(json["symbolsUsedWithoutFree"], serde_json::json!([0, 1]));
    }
}
