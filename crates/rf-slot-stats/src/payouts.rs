//! Payout metrics of a set of rounds
//!
//! [`PayoutAggregate`] routes each payout event of a spin to the accumulator
//! of its kind: static paylines by id, dynamic (all-paylines mode) lines by
//! their all-payline id, and one scatter-style accumulator each for wilds,
//! scatters, bonus symbols, super shapes and everything else.

use std::collections::BTreeMap;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::config::PaylineDef;
use crate::error::{StatsError, StatsResult};
use crate::metrics::{PaylineAccumulator, ScatterAccumulator};
use crate::results::{Payout, PayoutKind, RoundResult};

/// Payout metrics of the first (non-bonus) rounds or of one bonus category
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PayoutAggregate {
    no_paylines: bool,
    row_count: usize,
    max_symbol: u16,
    /// Winning rounds
    pub count: u64,
    /// Sum of round wins
    pub total: i64,
    pub wild: ScatterAccumulator,
    pub scatter: ScatterAccumulator,
    pub bonus: ScatterAccumulator,
    pub super_shape: ScatterAccumulator,
    pub other: ScatterAccumulator,
    paylines: Vec<Option<PaylineAccumulator>>,
    all_paylines: BTreeMap<i32, PaylineAccumulator>,
}

impl PayoutAggregate {
    pub fn new(row_count: usize, max_symbol: u16, paylines: &[PaylineDef], no_paylines: bool) -> Self {
        let mut p = Self::default();
        p.configure(row_count, max_symbol, paylines, no_paylines);
        p
    }

    /// Zero all data and size for a session
    pub fn configure(&mut self, row_count: usize, max_symbol: u16, paylines: &[PaylineDef], no_paylines: bool) {
        self.no_paylines = no_paylines;
        self.row_count = row_count;
        self.max_symbol = max_symbol;
        self.count = 0;
        self.total = 0;

        for s in self.scatters_mut() {
            s.set_max_symbol(max_symbol);
        }

        let len = paylines.iter().map(|l| l.id as usize + 1).max().unwrap_or(0);
        self.paylines.clear();
        self.paylines.resize(len, None);
        for l in paylines {
            self.paylines[l.id as usize] = Some(PaylineAccumulator::new(l.id as i32, max_symbol, &l.row_map));
        }
        self.all_paylines.clear();
    }

    fn scatters_mut(&mut self) -> [&mut ScatterAccumulator; 5] {
        [
            &mut self.wild,
            &mut self.scatter,
            &mut self.bonus,
            &mut self.super_shape,
            &mut self.other,
        ]
    }

    pub fn set_no_paylines(&mut self, no_paylines: bool) {
        self.no_paylines = no_paylines;
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn max_symbol(&self) -> u16 {
        self.max_symbol
    }

    /// Static payline accumulator by id
    pub fn payline(&self, id: u8) -> Option<&PaylineAccumulator> {
        self.paylines.get(id as usize).and_then(Option::as_ref)
    }

    /// Length of the static payline table
    pub fn payline_count(&self) -> usize {
        self.paylines.len()
    }

    /// Dynamic payline accumulator by all-payline id
    pub fn all_payline(&self, id: i32) -> Option<&PaylineAccumulator> {
        self.all_paylines.get(&id)
    }

    pub fn all_paylines(&self) -> impl Iterator<Item = &PaylineAccumulator> {
        self.all_paylines.values()
    }

    /// Record a round win (zero wins are ignored)
    pub fn analyse_round(&mut self, win: i64) {
        if win == 0 {
            return;
        }
        self.count += 1;
        self.total += win;
    }

    /// Record the payout events of one result
    pub fn analyse(&mut self, result: &RoundResult) -> StatsResult<()> {
        for pay in &result.payouts {
            match pay.kind {
                PayoutKind::Winline => {
                    if !self.no_paylines {
                        if pay.payline_id > 0 {
                            self.analyse_payline(pay)?;
                        } else {
                            self.analyse_all_payline(pay)?;
                        }
                    }
                }
                PayoutKind::Wilds => self.wild.increase(pay.symbol, pay.count, pay.factor)?,
                PayoutKind::Scatters | PayoutKind::BombScatters => {
                    self.scatter.increase(pay.symbol, pay.count, pay.factor)?
                }
                PayoutKind::BonusSymbol => self.bonus.increase(pay.symbol, pay.count, pay.factor)?,
                PayoutKind::SuperShape => {
                    self.super_shape.increase(pay.symbol, pay.count, pay.factor)?
                }
                _ => self.other.increase(pay.symbol, pay.count, pay.factor)?,
            }
        }
        Ok(())
    }

    fn analyse_payline(&mut self, pay: &Payout) -> StatsResult<()> {
        let line = self
            .paylines
            .get_mut(pay.payline_id as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| StatsError::unconfigured("payline", pay.payline_id))?;
        line.increase(pay.symbol, pay.count, pay.factor)
    }

    fn analyse_all_payline(&mut self, pay: &Payout) -> StatsResult<()> {
        let id = pay.all_payline_id;
        if id < 0 {
            return Err(StatsError::InvalidResult(format!(
                "All-paylines id cannot be negative: {}",
                id
            )));
        }

        let max_symbol = self.max_symbol;
        let line = self.all_paylines.entry(id).or_insert_with(|| {
            let rows = &pay.pay_rows[..(pay.count as usize).min(pay.pay_rows.len())];
            PaylineAccumulator::new(id, max_symbol, rows)
        });
        line.increase(pay.symbol, pay.count, pay.factor)
    }

    /// Average win of winning rounds
    pub fn avg_payout(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.total as f64 / self.count as f64
    }

    pub fn merge(&mut self, other: &Self) -> StatsResult<()> {
        StatsError::check("payout row count", self.row_count, other.row_count)?;
        StatsError::check("payout max symbol", self.max_symbol as usize, other.max_symbol as usize)?;
        StatsError::check("payline count", self.paylines.len(), other.paylines.len())?;

        self.count += other.count;
        self.total += other.total;

        for (a, b) in self.paylines.iter_mut().zip(&other.paylines) {
            if let (Some(a), Some(b)) = (a, b) {
                a.merge(b)?;
            }
        }

        for (id, b) in &other.all_paylines {
            let max_symbol = self.max_symbol;
            self.all_paylines
                .entry(*id)
                .or_insert_with(|| PaylineAccumulator::new(b.id(), max_symbol, b.row_map()))
                .merge(b)?;
        }

        self.wild.merge(&other.wild)?;
        self.scatter.merge(&other.scatter)?;
        self.bonus.merge(&other.bonus)?;
        self.super_shape.merge(&other.super_shape)?;
        self.other.merge(&other.other)
    }

    /// Zero all data, keeping sizing and the static paylines
    pub fn reset(&mut self) {
        self.count = 0;
        self.total = 0;
        for s in self.scatters_mut() {
            s.reset();
        }
        for l in self.paylines.iter_mut().flatten() {
            l.reset();
        }
        for l in self.all_paylines.values_mut() {
            l.reset();
        }
    }
}

impl Serialize for PayoutAggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("Payouts", 9)?;
        if self.count == 0 {
            st.skip_field("count")?;
        } else {
            st.serialize_field("count", &self.count)?;
        }
        if self.total == 0 {
            st.skip_field("total")?;
        } else {
            st.serialize_field("total", &self.total)?;
        }
        st.serialize_field("wildPayouts", &self.wild)?;
        st.serialize_field("scatterPayouts", &self.scatter)?;
        st.serialize_field("bonusSymbolPayouts", &self.bonus)?;
        st.serialize_field("superSymbolPayouts", &self.super_shape)?;
        st.serialize_field("otherPayouts", &self.other)?;
        if self.paylines.is_empty() {
            st.skip_field("paylines")?;
        } else {
            st.serialize_field("paylines", &self.paylines)?;
        }
        if self.all_paylines.is_empty() {
            st.skip_field("allPaylines")?;
        } else {
            st.serialize_field("allPaylines", &self.all_paylines)?;
        }
        st.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{SpinKind, SpinResult};

    fn three_lines() -> Vec<PaylineDef> {
        vec![
            PaylineDef::new(1, &[1, 1, 1, 1, 1]),
            PaylineDef::new(2, &[0, 0, 0, 0, 0]),
            PaylineDef::new(3, &[2, 2, 2, 2, 2]),
        ]
    }

    fn result(payouts: Vec<Payout>) -> RoundResult {
        RoundResult::spin(SpinResult::new(SpinKind::Regular, vec![1; 15]), 0.0).with_payouts(payouts)
    }

    #[test]
    fn test_winline_routing() {
        let mut p = PayoutAggregate::new(3, 12, &three_lines(), false);
        p.analyse(&result(vec![Payout::winline(1, 4, 3, 1.0)])).unwrap();

        let line = p.payline(1).unwrap();
        assert_eq!(line.count(), 1);
        assert_eq!(line.tally().symbols[4], 1);
        assert!((line.tally().payouts.total() - 1.0).abs() < 1e-9);
        assert_eq!(p.payline(2).unwrap().count(), 0);
        assert_eq!(p.payline_count(), 4);
        assert!(p.payline(0).is_none());
    }

    #[test]
    fn test_kind_routing() {
        let mut p = PayoutAggregate::new(3, 12, &[], false);
        p.analyse(&result(vec![
            Payout::new(PayoutKind::Wilds, 11, 4, 5.5),
            Payout::new(PayoutKind::Scatters, 12, 3, 2.0),
            Payout::new(PayoutKind::BombScatters, 12, 5, 4.0),
            Payout::new(PayoutKind::BonusSymbol, 10, 3, 1.0),
            Payout::new(PayoutKind::SuperShape, 2, 9, 7.0),
            Payout::new(PayoutKind::Cluster, 3, 8, 0.5),
        ]))
        .unwrap();

        assert_eq!(p.wild.count(), 1);
        assert_eq!(p.scatter.count(), 2);
        assert_eq!(p.bonus.count(), 1);
        assert_eq!(p.super_shape.count(), 1);
        assert_eq!(p.other.count(), 1);
    }

    #[test]
    fn test_unconfigured_payline() {
        let mut p = PayoutAggregate::new(3, 12, &three_lines(), false);
        let err = p.analyse(&result(vec![Payout::winline(7, 4, 3, 1.0)])).unwrap_err();
        assert_eq!(err, StatsError::unconfigured("payline", 7u8));

        // skipped entirely when paylines are disabled
        p.set_no_paylines(true);
        assert!(p.analyse(&result(vec![Payout::winline(7, 4, 3, 1.0)])).is_ok());
    }

    #[test]
    fn test_all_paylines() {
        let mut p = PayoutAggregate::new(4, 10, &[], false);
        p.analyse(&result(vec![
            Payout::all_payline(17, vec![0, 1, 2, 3, 0, 1], 3, 4, 2.0),
            Payout::all_payline(17, vec![0, 1, 2, 3, 0, 1], 3, 5, 4.0),
        ]))
        .unwrap();

        let line = p.all_payline(17).unwrap();
        assert_eq!(line.id(), 17);
        assert_eq!(line.row_map(), &[0, 1, 2, 3]);
        assert_eq!(line.count(), 2);

        let bad = Payout::all_payline(-1, vec![], 3, 3, 1.0);
        assert!(matches!(p.analyse(&result(vec![bad])), Err(StatsError::InvalidResult(_))));
    }

    #[test]
    fn test_analyse_round_and_avg() {
        let mut p = PayoutAggregate::new(3, 12, &[], false);
        assert_eq!(p.avg_payout(), 0.0);
        p.analyse_round(0);
        p.analyse_round(100);
        p.analyse_round(300);
        assert_eq!(p.count, 2);
        assert_eq!(p.total, 400);
        assert_eq!(p.avg_payout(), 200.0);
    }

    #[test]
    fn test_merge() {
        let mut a = PayoutAggregate::new(3, 12, &three_lines(), false);
        let mut b = PayoutAggregate::new(3, 12, &three_lines(), false);
        a.analyse(&result(vec![Payout::winline(1, 4, 3, 1.0)])).unwrap();
        b.analyse(&result(vec![
            Payout::winline(1, 5, 4, 2.0),
            Payout::all_payline(3, vec![2, 2, 2], 6, 3, 1.0),
            Payout::new(PayoutKind::Wilds, 11, 3, 1.0),
        ]))
        .unwrap();
        b.analyse_round(50);

        a.merge(&b).unwrap();
        assert_eq!(a.count, 1);
        assert_eq!(a.total, 50);
        assert_eq!(a.payline(1).unwrap().count(), 2);
        assert_eq!(a.all_payline(3).unwrap().row_map(), &[2, 2, 2]);
        assert_eq!(a.wild.count(), 1);
    }

    #[test]
    fn test_merge_mismatch() {
        let mut a = PayoutAggregate::new(3, 12, &three_lines(), false);
        assert!(a.merge(&PayoutAggregate::new(4, 12, &three_lines(), false)).is_err());
        assert!(a.merge(&PayoutAggregate::new(3, 11, &three_lines(), false)).is_err());
        assert!(a.merge(&PayoutAggregate::new(3, 12, &three_lines()[..2], false)).is_err());
        assert_eq!(a, PayoutAggregate::new(3, 12, &three_lines(), false));
    }

    #[test]
    fn test_clone_and_reset() {
        let mut p = PayoutAggregate::new(3, 12, &three_lines(), false);
        p.analyse(&result(vec![Payout::winline(2, 4, 3, 1.0)])).unwrap();
        p.analyse_round(10);
        assert_eq!(p.clone(), p);

        p.reset();
        assert_eq!(p.count, 0);
        assert_eq!(p.payline(2).unwrap().count(), 0);
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(PayoutAggregate::new(3, 2, &[], false)).unwrap();
        assert!(json.get("count").is_none());
        assert!(json.get("paylines").is_none());
        assert!(json.get("wildPayouts").is_some());

        let mut p = PayoutAggregate::new(3, 2, &[PaylineDef::new(2, &[0, 0, 0])], false);
        p.analyse_round(5);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["total"], 5);
        assert!(json["paylines"][0].is_null());
        assert_eq!(json["paylines"][2]["id"], 2);
    }
}
