//! Per-action occurrence and trigger metrics

use serde::Serialize;

use super::is_zero;
use crate::config::ActionDef;
use crate::error::{StatsError, StatsResult};

/// Placeholder identity for actions seen in results but not configured
pub const UNKNOWN_ACTION: &str = "?";

/// Occurrence counts of one spin action by phase
///
/// Each `*_triggered` counter is a subset of the matching `*_count`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionAccumulator {
    #[serde(skip_serializing_if = "is_zero16")]
    pub id: u16,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_count: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_count: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub second_count: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub free_count: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub free_second_count: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub super_count: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub refill_count: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_triggered: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_triggered: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub second_triggered: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub free_triggered: u64,
    #[serde(rename = "freeTriggeredCount", skip_serializing_if = "is_zero")]
    pub free_second_triggered: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub super_triggered: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub refill_triggered: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub config: String,
}

fn is_zero16(v: &u16) -> bool {
    *v == 0
}

impl ActionAccumulator {
    pub fn new(id: u16, name: &str, kind: &str, config: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind: kind.to_string(),
            config: config.to_string(),
            ..Default::default()
        }
    }

    /// Accumulator for an action id missing from the session config
    pub fn placeholder(id: u16) -> Self {
        Self::new(id, UNKNOWN_ACTION, UNKNOWN_ACTION, UNKNOWN_ACTION)
    }

    #[inline]
    fn total(&mut self, triggered: bool) {
        self.total_count += 1;
        if triggered {
            self.total_triggered += 1;
        }
    }

    pub fn increase_first(&mut self, triggered: bool) {
        self.total(triggered);
        self.first_count += 1;
        if triggered {
            self.first_triggered += 1;
        }
    }

    pub fn increase_second(&mut self, triggered: bool) {
        self.total(triggered);
        self.second_count += 1;
        if triggered {
            self.second_triggered += 1;
        }
    }

    pub fn increase_free(&mut self, triggered: bool) {
        self.total(triggered);
        self.free_count += 1;
        if triggered {
            self.free_triggered += 1;
        }
    }

    pub fn increase_second_free(&mut self, triggered: bool) {
        self.total(triggered);
        self.free_second_count += 1;
        if triggered {
            self.free_second_triggered += 1;
        }
    }

    pub fn increase_super(&mut self, triggered: bool) {
        self.total(triggered);
        self.super_count += 1;
        if triggered {
            self.super_triggered += 1;
        }
    }

    pub fn increase_refill(&mut self, triggered: bool) {
        self.total(triggered);
        self.refill_count += 1;
        if triggered {
            self.refill_triggered += 1;
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.total_count += other.total_count;
        self.first_count += other.first_count;
        self.second_count += other.second_count;
        self.free_count += other.free_count;
        self.free_second_count += other.free_second_count;
        self.super_count += other.super_count;
        self.refill_count += other.refill_count;
        self.total_triggered += other.total_triggered;
        self.first_triggered += other.first_triggered;
        self.second_triggered += other.second_triggered;
        self.free_triggered += other.free_triggered;
        self.free_second_triggered += other.free_second_triggered;
        self.super_triggered += other.super_triggered;
        self.refill_triggered += other.refill_triggered;
    }

    /// Zero all counters, keeping identity
    pub fn reset(&mut self) {
        *self = Self {
            id: self.id,
            name: std::mem::take(&mut self.name),
            kind: std::mem::take(&mut self.kind),
            config: std::mem::take(&mut self.config),
            ..Default::default()
        };
    }
}

/// Action accumulators indexed by action id
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Actions {
    items: Vec<Option<ActionAccumulator>>,
    #[serde(skip)]
    configured: usize,
}

impl Actions {
    /// Size for the session's actions, alternates included
    pub fn configure(&mut self, defs: &[ActionDef]) {
        let len = defs
            .iter()
            .flat_map(ActionDef::chain)
            .map(|d| d.id as usize + 1)
            .max()
            .unwrap_or(0);
        self.items.clear();
        self.items.resize(len, None);
        self.configured = len;
        for def in defs.iter().flat_map(ActionDef::chain) {
            self.items[def.id as usize] = Some(ActionAccumulator::new(
                def.id,
                &def.name,
                &def.kind,
                &def.config,
            ));
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Length from the session config, before any placeholder growth
    pub fn configured_len(&self) -> usize {
        self.configured
    }

    pub fn get(&self, id: u16) -> Option<&ActionAccumulator> {
        self.items.get(id as usize).and_then(Option::as_ref)
    }

    /// Accumulator for `id`, creating a placeholder when absent
    pub fn entry(&mut self, id: u16) -> &mut ActionAccumulator {
        let ix = id as usize;
        if ix >= self.items.len() {
            self.items.resize(ix + 1, None);
        }
        self.items[ix].get_or_insert_with(|| {
            log::debug!("Unconfigured action {} seen in results", id);
            ActionAccumulator::placeholder(id)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionAccumulator> {
        self.items.iter().flatten()
    }

    /// Fold the peer in, adopting accumulators only the peer has
    pub fn merge(&mut self, other: &Self) -> StatsResult<()> {
        StatsError::check("action count", self.configured, other.configured)?;
        if other.items.len() > self.items.len() {
            self.items.resize(other.items.len(), None);
        }
        for (a, b) in self.items.iter_mut().zip(&other.items) {
            if let Some(b) = b {
                a.get_or_insert_with(|| ActionAccumulator::new(b.id, &b.name, &b.kind, &b.config))
                    .merge(b);
            }
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        for a in self.items.iter_mut().flatten() {
            a.reset();
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.configured = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggered_subset() {
        let mut a = ActionAccumulator::new(5, "expand", "wild", "reel=3");
        a.increase_first(true);
        a.increase_first(false);
        a.increase_free(true);
        a.increase_second_free(true);
        a.increase_refill(false);
        a.increase_super(true);
        a.increase_second(false);

        assert_eq!(a.total_count, 7);
        assert_eq!(a.total_triggered, 4);
        assert_eq!(a.first_count, 2);
        assert_eq!(a.first_triggered, 1);
        assert_eq!(a.free_second_triggered, 1);
        assert!(a.refill_triggered <= a.refill_count);
    }

    #[test]
    fn test_merge_and_reset() {
        let mut a = ActionAccumulator::new(1, "sticky", "hold", "");
        a.increase_first(true);
        let mut b = a.clone();
        b.increase_super(false);

        a.merge(&b);
        assert_eq!(a.total_count, 3);
        assert_eq!(a.super_count, 1);
        assert_eq!(a.first_triggered, 2);

        a.reset();
        assert_eq!(a, ActionAccumulator::new(1, "sticky", "hold", ""));
    }

    #[test]
    fn test_collection_alternates_and_placeholders() {
        let defs = vec![
            ActionDef::new(1, "a", "kind", "").with_alternate(ActionDef::new(4, "a2", "kind", "")),
            ActionDef::new(2, "b", "kind", ""),
        ];
        let mut actions = Actions::default();
        actions.configure(&defs);

        assert_eq!(actions.len(), 5);
        assert_eq!(actions.get(4).unwrap().name, "a2");
        assert!(actions.get(3).is_none());

        actions.entry(3).increase_first(true);
        assert_eq!(actions.get(3).unwrap().name, UNKNOWN_ACTION);

        actions.entry(7).increase_free(false);
        assert_eq!(actions.len(), 8);
        assert_eq!(actions.configured_len(), 5);
    }

    #[test]
    fn test_collection_merge_adopts_missing() {
        let defs = vec![ActionDef::new(0, "a", "k", ""), ActionDef::new(2, "c", "k", "")];
        let mut a = Actions::default();
        a.configure(&defs);
        let mut b = a.clone();
        b.entry(1).increase_first(true);

        b.entry(6).increase_second(false);

        a.merge(&b).unwrap();
        assert_eq!(a.get(1).unwrap().first_triggered, 1);
        assert_eq!(a.get(1).unwrap().kind, UNKNOWN_ACTION);
        assert_eq!(a.get(6).unwrap().second_count, 1);

        let mut c = Actions::default();
        c.configure(&defs[..1]);
        assert!(matches!(a.merge(&c), Err(StatsError::ConfigMismatch { .. })));
    }

    #[test]
    fn test_freesecond_wire_name() {
        let mut a = ActionAccumulator::new(3, "x", "", "");
        a.increase_second_free(true);
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["freeTriggeredCount"], 1);
        assert_eq!(json["freeSecondCount"], 1);
        assert!(json.get("kind").is_none());
    }
}
