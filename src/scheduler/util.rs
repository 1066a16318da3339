use crate::model::{LabUnit, ShiftType};
use std::collections::BTreeMap;

/// Origine d'une affectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Source {
    Forced,
    Preferred,
    Relaxed,
    Choice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Placement {
    pub shift: ShiftType,
    pub unit: Option<LabUnit>,
    pub source: Source,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Free,
    Absent,
    Placed(Placement),
}

/// Accumulateur du jour : qui tient quoi, et l'effectif par cellule.
///
/// Seul détenteur des compteurs du jour.
#[derive(Debug)]
pub(super) struct DayLedger {
    slots: Vec<Slot>,
    counts: BTreeMap<(LabUnit, ShiftType), u32>,
}

impl DayLedger {
    pub fn new(staff_count: usize) -> Self {
        Self {
            slots: vec![Slot::Free; staff_count],
            counts: BTreeMap::new(),
        }
    }

    pub fn is_free(&self, staff: usize) -> bool {
        self.slots[staff] == Slot::Free
    }

    pub fn mark_absent(&mut self, staff: usize) {
        self.slots[staff] = Slot::Absent;
    }

    pub fn placement(&self, staff: usize) -> Option<Placement> {
        match self.slots[staff] {
            Slot::Placed(p) => Some(p),
            _ => None,
        }
    }

    pub fn count(&self, unit: LabUnit, shift: ShiftType) -> u32 {
        self.counts.get(&(unit, shift)).copied().unwrap_or(0)
    }

    pub fn place(&mut self, staff: usize, placement: Placement) {
        if let Some(unit) = placement.unit {
            *self.counts.entry((unit, placement.shift)).or_insert(0) += 1;
        }
        self.slots[staff] = Slot::Placed(placement);
    }

    pub fn release(&mut self, staff: usize) -> Option<Placement> {
        let placement = self.placement(staff)?;
        if let Some(unit) = placement.unit {
            if let Some(count) = self.counts.get_mut(&(unit, placement.shift)) {
                *count = count.saturating_sub(1);
            }
        }
        self.slots[staff] = Slot::Free;
        Some(placement)
    }

    pub fn free_staff(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == Slot::Free)
            .map(|(i, _)| i)
    }
}
