//! Round flag value metrics

use serde::Serialize;

use super::histogram::IntHistogram;
use crate::config::FlagDef;
use crate::error::StatsResult;

/// Placeholder name for flags seen in results but not configured
pub const UNKNOWN_FLAG: &str = "???";

/// Value histogram of one round flag
///
/// `counts` sees every spin; `counts_final` only the last spin of each round.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundFlagAccumulator {
    pub id: usize,
    pub counts: IntHistogram,
    pub counts_final: IntHistogram,
    pub name: String,
}

impl RoundFlagAccumulator {
    pub fn new(id: usize, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn increase(&mut self, value: i64, is_final: bool) {
        self.counts.increase(value);
        if is_final {
            self.counts_final.increase(value);
        }
    }

    pub fn merge(&mut self, other: &Self) -> StatsResult<()> {
        self.counts.merge(&other.counts)?;
        self.counts_final.merge(&other.counts_final)
    }

    pub fn reset(&mut self) {
        self.counts.reset();
        self.counts_final.reset();
    }
}

/// Round flag accumulators indexed by flag id
///
/// Grows when results carry non-zero values for flags beyond the configured set.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct RoundFlags {
    items: Vec<Option<RoundFlagAccumulator>>,
}

impl RoundFlags {
    pub fn configure(&mut self, defs: &[FlagDef]) {
        let len = defs.iter().map(|d| d.id + 1).max().unwrap_or(0);
        self.items.clear();
        self.items.resize(len, None);
        for def in defs {
            self.items[def.id] = Some(RoundFlagAccumulator::new(def.id, &def.name));
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&RoundFlagAccumulator> {
        self.items.get(id).and_then(Option::as_ref)
    }

    fn entry(&mut self, id: usize, name: &str) -> &mut RoundFlagAccumulator {
        if id >= self.items.len() {
            self.items.resize(id + 1, None);
        }
        self.items[id].get_or_insert_with(|| RoundFlagAccumulator::new(id, name))
    }

    /// Record one spin's flag values (indexed by flag id)
    pub fn analyse(&mut self, values: &[i64], is_final: bool) {
        for (id, &value) in values.iter().enumerate() {
            if id >= self.items.len() && value == 0 {
                continue;
            }
            self.entry(id, UNKNOWN_FLAG).increase(value, is_final);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoundFlagAccumulator> {
        self.items.iter().flatten()
    }

    pub fn merge(&mut self, other: &Self) -> StatsResult<()> {
        for flag in other.iter() {
            self.entry(flag.id, &flag.name).merge(flag)?;
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        for f in self.items.iter_mut().flatten() {
            f.reset();
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_split() {
        let mut f = RoundFlagAccumulator::new(0, "respin");
        f.increase(1, false);
        f.increase(0, false);
        f.increase(1, true);

        assert_eq!(f.counts.count(), 3);
        assert_eq!(f.counts.get(1), 2);
        assert_eq!(f.counts_final.count(), 1);
    }

    #[test]
    fn test_analyse_grows_for_non_zero() {
        let mut flags = RoundFlags::default();
        flags.configure(&[FlagDef::new(0, "respin")]);

        flags.analyse(&[1, 0, 0, 2], true);
        assert_eq!(flags.len(), 4);
        assert!(flags.get(1).is_none());
        assert_eq!(flags.get(3).unwrap().name, UNKNOWN_FLAG);
        assert_eq!(flags.get(3).unwrap().counts_final.get(2), 1);

        // zeroes inside the known range still count, beyond it they are dropped
        flags.analyse(&[0, 0, 0, 0, 0, 0], false);
        assert_eq!(flags.len(), 4);
        assert_eq!(flags.get(1).unwrap().counts.get(0), 1);
        assert_eq!(flags.get(3).unwrap().counts.count(), 2);
    }

    #[test]
    fn test_merge_grows() {
        let mut a = RoundFlags::default();
        a.configure(&[FlagDef::new(0, "respin")]);
        let mut b = RoundFlags::default();
        b.configure(&[FlagDef::new(0, "respin"), FlagDef::new(2, "hold")]);
        b.analyse(&[1, 0, 1], true);

        a.merge(&b).unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(a.get(2).unwrap().name, "hold");
        assert_eq!(a.get(0).unwrap().counts.get(1), 1);
    }

    #[test]
    fn test_wire_fields() {
        let f = RoundFlagAccumulator::new(2, "hold");
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["id"], 2);
        assert_eq!(json["name"], "hold");
        assert_eq!(json["counts"]["count"], 0);
        assert_eq!(json["countsFinal"]["total"], 0);
    }
}
