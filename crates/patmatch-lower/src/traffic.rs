//! Load/store accounting over a decision sequence.
//!
//! A slot is stored by `extract ... -> sN` and `unbox ... -> sN`, and
//! loaded by every step that reads it. A `bind` counts as the load the
//! body performs. The selector slot is an input: it has no store.

use crate::sequence::{DecisionSequence, SlotId, SlotKind};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Traffic {
    pub stores: usize,
    pub loads: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotTraffic {
    per_slot: Vec<Traffic>,
}

impl SlotTraffic {
    pub fn of(sequence: &DecisionSequence) -> Self {
        let mut per_slot = vec![Traffic::default(); sequence.slots.len()];
        for step in sequence.steps() {
            if let Some(slot) = step.stores() {
                if let Some(t) = per_slot.get_mut(slot.0 as usize) {
                    t.stores += 1;
                }
            }
            if let Some(slot) = step.loads() {
                if let Some(t) = per_slot.get_mut(slot.0 as usize) {
                    t.loads += 1;
                }
            }
        }
        SlotTraffic { per_slot }
    }

    pub fn get(&self, slot: SlotId) -> Traffic {
        self.per_slot
            .get(slot.0 as usize)
            .copied()
            .unwrap_or_default()
    }

    /// Slots written but never read.
    pub fn unused_stores(&self) -> Vec<SlotId> {
        self.slots_where(|t| t.stores > 0 && t.loads == 0)
    }

    /// Slots read but never written. The selector is excluded.
    pub fn unset_loads(&self, sequence: &DecisionSequence) -> Vec<SlotId> {
        self.slots_where(|t| t.stores == 0 && t.loads > 0)
            .into_iter()
            .filter(|id| {
                sequence
                    .slot(*id)
                    .is_some_and(|slot| slot.kind != SlotKind::Selector)
            })
            .collect()
    }

    pub fn total_stores(&self) -> usize {
        self.per_slot.iter().map(|t| t.stores).sum()
    }

    fn slots_where(&self, pred: impl Fn(&Traffic) -> bool) -> Vec<SlotId> {
        self.per_slot
            .iter()
            .enumerate()
            .filter(|(_, t)| pred(t))
            .map(|(i, _)| SlotId(i as u32))
            .collect()
    }
}
