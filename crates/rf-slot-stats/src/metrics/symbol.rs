//! Per-symbol appearance and payout-length metrics

use serde::Serialize;

use super::is_zero;
use crate::config::SymbolDef;
use crate::error::{StatsError, StatsResult};

/// Appearance counts of one symbol, split by spin phase and reel
///
/// `total_count == first_count + second_count + free_count + free_second_count`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolAccumulator {
    pub id: u16,
    pub total_count: u64,
    pub first_count: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub second_count: u64,
    pub free_count: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub free_second_count: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub bonus_count: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub sticky_count: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub super_count: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub total_reels: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub first_reels: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub second_reels: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub free_reels: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub free_second_reels: Vec<u64>,
    /// Payout occurrences indexed by `matched length - 2`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub payouts: Vec<u64>,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource: String,
}

impl SymbolAccumulator {
    /// Create an accumulator for a symbol on a game with `reel_count` reels
    pub fn new(id: u16, name: &str, resource: &str, reel_count: usize) -> Self {
        let mut s = Self::default();
        s.configure(id, name, resource, reel_count);
        s
    }

    /// Re-identify a recycled accumulator
    pub fn configure(&mut self, id: u16, name: &str, resource: &str, reel_count: usize) {
        self.reset();
        self.id = id;
        self.name.clear();
        self.name.push_str(name);
        self.resource.clear();
        self.resource.push_str(resource);
        for reels in self.reels_mut() {
            reels.resize(reel_count, 0);
        }
    }

    fn reels_mut(&mut self) -> [&mut Vec<u64>; 5] {
        [
            &mut self.total_reels,
            &mut self.first_reels,
            &mut self.second_reels,
            &mut self.free_reels,
            &mut self.free_second_reels,
        ]
    }

    /// Seen on a regular or first spin
    #[inline]
    pub fn increase_first(&mut self, reel: usize) {
        self.total_count += 1;
        self.total_reels[reel] += 1;
        self.first_count += 1;
        self.first_reels[reel] += 1;
    }

    /// Seen on a second spin
    #[inline]
    pub fn increase_second(&mut self, reel: usize) {
        self.total_count += 1;
        self.total_reels[reel] += 1;
        self.second_count += 1;
        self.second_reels[reel] += 1;
    }

    /// Seen on a free spin
    #[inline]
    pub fn increase_free(&mut self, reel: usize) {
        self.total_count += 1;
        self.total_reels[reel] += 1;
        self.free_count += 1;
        self.free_reels[reel] += 1;
    }

    /// Seen on a second free spin
    #[inline]
    pub fn increase_second_free(&mut self, reel: usize) {
        self.total_count += 1;
        self.total_reels[reel] += 1;
        self.free_second_count += 1;
        self.free_second_reels[reel] += 1;
    }

    pub fn increase_bonus(&mut self) {
        self.bonus_count += 1;
    }

    pub fn increase_sticky(&mut self) {
        self.sticky_count += 1;
    }

    pub fn increase_super(&mut self) {
        self.super_count += 1;
    }

    /// Count `count` payouts of matched length `length`
    ///
    /// Lengths below 2 are not payouts and are ignored.
    pub fn add_payout(&mut self, length: u8, count: u64) {
        if length < 2 {
            return;
        }
        let ix = (length - 2) as usize;
        if ix >= self.payouts.len() {
            self.payouts.resize(ix + 1, 0);
        }
        self.payouts[ix] += count;
    }

    /// Number of reels this accumulator was sized for
    pub fn reel_count(&self) -> usize {
        self.total_reels.len()
    }

    pub fn merge(&mut self, other: &Self) -> StatsResult<()> {
        StatsError::check("symbol reel count", self.reel_count(), other.reel_count())?;

        self.total_count += other.total_count;
        self.first_count += other.first_count;
        self.second_count += other.second_count;
        self.free_count += other.free_count;
        self.free_second_count += other.free_second_count;
        self.bonus_count += other.bonus_count;
        self.sticky_count += other.sticky_count;
        self.super_count += other.super_count;

        add_assign(&mut self.total_reels, &other.total_reels);
        add_assign(&mut self.first_reels, &other.first_reels);
        add_assign(&mut self.second_reels, &other.second_reels);
        add_assign(&mut self.free_reels, &other.free_reels);
        add_assign(&mut self.free_second_reels, &other.free_second_reels);

        for (ix, &n) in other.payouts.iter().enumerate() {
            self.add_payout(ix as u8 + 2, n);
        }
        Ok(())
    }

    /// Zero all counters, keeping identity and reel sizing
    pub fn reset(&mut self) {
        self.total_count = 0;
        self.first_count = 0;
        self.second_count = 0;
        self.free_count = 0;
        self.free_second_count = 0;
        self.bonus_count = 0;
        self.sticky_count = 0;
        self.super_count = 0;
        for reels in self.reels_mut() {
            reels.fill(0);
        }
        self.payouts.clear();
    }
}

fn add_assign(into: &mut [u64], from: &[u64]) {
    for (a, b) in into.iter_mut().zip(from) {
        *a += b;
    }
}

/// Symbol accumulators indexed by symbol id
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Symbols {
    items: Vec<Option<SymbolAccumulator>>,
}

impl Symbols {
    /// Size for the session's symbol set
    ///
    /// Ids without a definition stay empty; grid symbols with such ids are rejected.
    pub fn configure(&mut self, defs: &[SymbolDef], reel_count: usize) {
        let len = defs.iter().map(|d| d.id as usize + 1).max().unwrap_or(0);
        self.items.clear();
        self.items.resize(len, None);
        for def in defs {
            self.items[def.id as usize] = Some(SymbolAccumulator::new(
                def.id,
                &def.name,
                &def.resource,
                reel_count,
            ));
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: u16) -> Option<&SymbolAccumulator> {
        self.items.get(id as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: u16) -> Option<&mut SymbolAccumulator> {
        self.items.get_mut(id as usize).and_then(Option::as_mut)
    }

    /// Accumulator for a symbol that must be configured
    pub fn require_mut(&mut self, id: u16) -> StatsResult<&mut SymbolAccumulator> {
        self.get_mut(id)
            .ok_or_else(|| StatsError::unconfigured("symbol", id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolAccumulator> {
        self.items.iter().flatten()
    }

    pub fn merge(&mut self, other: &Self) -> StatsResult<()> {
        StatsError::check("symbol count", self.len(), other.len())?;
        for (a, b) in self.items.iter_mut().zip(&other.items) {
            if let (Some(a), Some(b)) = (a, b) {
                a.merge(b)?;
            }
        }
        Ok(())
    }

    /// Zero every accumulator
    pub fn reset(&mut self) {
        for s in self.items.iter_mut().flatten() {
            s.reset();
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
