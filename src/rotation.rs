//! Rotation de nuit : N → N → SD → DO, atomique une fois lancée.

use crate::model::{LabUnit, RosterCell, ShiftType};
use thiserror::Error;

/// Longueur d'une rotation complète, en jours.
pub const ROTATION_SPAN: usize = 4;

/// État après le dernier jour enregistré.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationPhase {
    #[default]
    Idle,
    Night1,
    Night2,
    ShortDayRecovery,
    DayOffRecovery,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("rotation violation for staff #{staff}: expected {expected:?}, attempted {attempted:?}")]
pub struct RotationViolation {
    pub staff: usize,
    pub expected: Option<ShiftType>,
    pub attempted: Option<ShiftType>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    phase: RotationPhase,
    night_unit: Option<LabUnit>,
    /// Plus récent d'abord.
    recent: [Option<ShiftType>; 3],
}

/// Arène fixe d'états de rotation, un slot par position.
#[derive(Debug, Clone)]
pub struct RotationTracker {
    slots: Vec<Slot>,
}

impl RotationTracker {
    pub fn new(staff_count: usize) -> Self {
        Self {
            slots: vec![Slot::default(); staff_count],
        }
    }

    pub fn phase(&self, staff: usize) -> RotationPhase {
        self.slots[staff].phase
    }

    /// Trois derniers postes enregistrés, plus récent d'abord.
    pub fn recent(&self, staff: usize) -> [Option<ShiftType>; 3] {
        self.slots[staff].recent
    }

    /// Unité de la paire de nuits en cours.
    pub fn night_unit(&self, staff: usize) -> Option<LabUnit> {
        self.slots[staff].night_unit
    }

    /// Poste imposé pour le jour en cours d'affectation, s'il y en a un.
    pub fn next_forced_shift(&self, staff: usize) -> Option<ShiftType> {
        match self.slots[staff].phase {
            RotationPhase::Night1 => Some(ShiftType::Night),
            RotationPhase::Night2 => Some(ShiftType::ShortDay),
            RotationPhase::ShortDayRecovery => Some(ShiftType::DayOff),
            RotationPhase::Idle | RotationPhase::DayOffRecovery => None,
        }
    }

    /// Affecter `shift` aujourd'hui respecte-t-il la loi de rotation ?
    pub fn check(&self, staff: usize, shift: ShiftType) -> Result<(), RotationViolation> {
        let expected = self.next_forced_shift(staff);
        let allowed = match expected {
            Some(forced) => shift == forced,
            None => shift != ShiftType::ShortDay,
        };
        if allowed {
            Ok(())
        } else {
            Err(RotationViolation {
                staff,
                expected,
                attempted: Some(shift),
            })
        }
    }

    /// Une nouvelle paire de nuits peut-elle démarrer aujourd'hui ?
    pub fn can_start_night(&self, staff: usize) -> bool {
        self.next_forced_shift(staff).is_none()
    }

    /// Avance d'un jour avec la cellule finale de `staff`.
    ///
    /// Une cellule qui casse une transition en attente (typiquement un congé)
    /// remet le slot à `Idle` et est signalée.
    pub fn record(&mut self, staff: usize, cell: &RosterCell) -> Result<(), RotationViolation> {
        let expected = self.next_forced_shift(staff);
        let shift = cell.shift();
        let slot = &mut self.slots[staff];

        slot.recent.rotate_right(1);
        slot.recent[0] = shift;

        if let Some(forced) = expected {
            if shift != Some(forced) {
                slot.phase = RotationPhase::Idle;
                slot.night_unit = None;
                return Err(RotationViolation {
                    staff,
                    expected,
                    attempted: shift,
                });
            }
        }

        slot.phase = match (slot.phase, shift) {
            (RotationPhase::Idle | RotationPhase::DayOffRecovery, Some(ShiftType::Night)) => {
                slot.night_unit = cell.unit();
                RotationPhase::Night1
            }
            (RotationPhase::Night1, Some(ShiftType::Night)) => RotationPhase::Night2,
            (RotationPhase::Night2, Some(ShiftType::ShortDay)) => RotationPhase::ShortDayRecovery,
            (RotationPhase::ShortDayRecovery, Some(ShiftType::DayOff)) => {
                slot.night_unit = None;
                RotationPhase::DayOffRecovery
            }
            _ => RotationPhase::Idle,
        };
        Ok(())
    }
}
