//! Bounded retention of the highest-paying rounds

use serde::{Serialize, Serializer};

use crate::config::DEFAULT_MAX_BEST;
use crate::results::RoundResult;

/// A retained round with the payout factor it was ranked by
#[derive(Debug, Clone, PartialEq)]
pub struct BestRound {
    pub factor: f64,
    pub results: Vec<RoundResult>,
}

/// Top-K list of rounds, non-increasing by payout factor
///
/// Equal factors keep insertion order. When full, a better round evicts the
/// last entry and a round no better than the last entry is discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct BestRoundsRetainer {
    entries: Vec<BestRound>,
    max_best: usize,
}

impl BestRoundsRetainer {
    pub fn new(max_best: usize) -> Self {
        Self {
            entries: Vec::with_capacity(max_best + 1),
            max_best,
        }
    }

    pub fn max_best(&self) -> usize {
        self.max_best
    }

    /// Change the list size, dropping entries beyond it
    pub fn set_max_best(&mut self, max_best: usize) {
        self.max_best = max_best;
        self.entries.truncate(max_best);
    }

    /// Offer a round; returns whether it was kept
    pub fn insert(&mut self, results: &[RoundResult], factor: f64) -> bool {
        if self.max_best == 0 {
            return false;
        }
        let full = self.entries.len() >= self.max_best;
        match self.entries.iter().position(|e| e.factor < factor) {
            Some(ix) => {
                if full {
                    self.entries.pop();
                }
                self.entries.insert(
                    ix,
                    BestRound {
                        factor,
                        results: results.to_vec(),
                    },
                );
                true
            }
            None if !full => {
                self.entries.push(BestRound {
                    factor,
                    results: results.to_vec(),
                });
                true
            }
            None => false,
        }
    }

    /// Replay the peer's rounds through [`insert`](Self::insert)
    ///
    /// The outcome for tied factors depends on merge order.
    pub fn merge(&mut self, other: &Self) {
        for e in &other.entries {
            self.insert(&e.results, e.factor);
        }
    }

    pub fn entries(&self) -> &[BestRound] {
        &self.entries
    }

    pub fn factors(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.factor).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for BestRoundsRetainer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BEST)
    }
}

impl Serialize for BestRoundsRetainer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter().map(|e| &e.results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{SpinKind, SpinResult};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn round(total: f64) -> Vec<RoundResult> {
        vec![RoundResult::spin(SpinResult::new(SpinKind::Regular, vec![1, 2, 3]), total)]
    }

    fn offer(best: &mut BestRoundsRetainer, factor: f64) -> bool {
        best.insert(&round(factor), factor)
    }

    #[test]
    fn test_keeps_top_k_descending() {
        let mut best = BestRoundsRetainer::new(3);
        for f in [10.0, 30.0, 20.0, 5.0] {
            offer(&mut best, f);
        }
        assert_eq!(best.factors(), vec![30.0, 20.0, 10.0]);

        assert!(offer(&mut best, 25.0));
        assert_eq!(best.factors(), vec![30.0, 25.0, 20.0]);
        assert!(!offer(&mut best, 20.0));
        assert_eq!(best.len(), 3);

        let mut none = BestRoundsRetainer::new(0);
        assert!(!offer(&mut none, 1.0));
        assert!(none.is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut best = BestRoundsRetainer::new(4);
        let a = round(1.0);
        let mut b = round(1.0);
        b[0].awarded_free_games = 7;

        best.insert(&a, 50.0);
        best.insert(&b, 50.0);
        assert_eq!(best.entries()[0].results, a);
        assert_eq!(best.entries()[1].results, b);
    }

    #[test]
    fn test_deep_copies() {
        let mut best = BestRoundsRetainer::new(2);
        let mut r = round(3.0);
        best.insert(&r, 3.0);
        r[0].total = 99.0;
        assert_eq!(best.entries()[0].results[0].total, 3.0);
    }

    #[test]
    fn test_merge_replays_factors() {
        let mut a = BestRoundsRetainer::new(3);
        let mut b = BestRoundsRetainer::new(3);
        for f in [100.0, 40.0] {
            offer(&mut a, f);
        }
        for f in [90.0, 60.0, 10.0] {
            offer(&mut b, f);
        }

        a.merge(&b);
        assert_eq!(a.factors(), vec![100.0, 90.0, 60.0]);
    }

    #[test]
    fn test_bounded_and_ordered() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let mut best = BestRoundsRetainer::new(5);
        for _ in 0..200 {
            offer(&mut best, rng.random_range(0.0..1000.0));
            assert!(best.len() <= 5);
            assert!(best.factors().windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_serialize_as_rounds() {
        let mut best = BestRoundsRetainer::new(2);
        offer(&mut best, 4.0);
        let json = serde_json::to_value(&best).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0][0]["total"], 4.0);
        assert_eq!(json[0][0]["data"]["type"], "spin");
    }
}
