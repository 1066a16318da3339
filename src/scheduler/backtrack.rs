//! Replis pour les cellules que la passe préférentielle n'a pas remplies.
//!
//! 1. Passe relâchée : toute personne libre dont l'éligibilité large couvre
//!    le poste, sans tenir compte du classement du jour.
//! 2. Chaîne augmentante : une personne déjà placée sur un poste de jour peut
//!    passer sur la cellule en manque. Une cellule libérée qui tomberait sous
//!    son minimum est recomplétée de la même façon (personne libre ou autre
//!    déplacement), donc une chaîne peut couvrir ce qu'aucun échange simple
//!    n'atteint. Chaque personne bouge au plus une fois par recherche.
//!
//! Exclusions, congés et loi de rotation sont vérifiés par `try_place` à
//! chaque déplacement.

use super::util::{DayLedger, Source};
use super::Scheduler;
use crate::calendar::Day;
use crate::coverage::CoverageRequirement;
use crate::model::{LabUnit, ShiftType};
use tracing::debug;

pub(super) fn relaxed_fill(
    scheduler: &mut Scheduler<'_>,
    day: &Day,
    ledger: &mut DayLedger,
    unit: LabUnit,
    shift: ShiftType,
    req: CoverageRequirement,
) {
    for staff in relaxed_pool(scheduler, ledger, unit, shift) {
        if req.is_satisfied(ledger.count(unit, shift)) {
            break;
        }
        match scheduler.try_place(ledger, day, staff, shift, Some(unit), Source::Relaxed) {
            Ok(()) => debug!(staff = %scheduler.staff[staff].id, %unit, %shift, "relaxed assignment"),
            Err(err) => debug!(staff = %scheduler.staff[staff].id, %shift, %err, "relaxed candidate refused"),
        }
    }
}

pub(super) fn swap_fill(
    scheduler: &mut Scheduler<'_>,
    day: &Day,
    ledger: &mut DayLedger,
    unit: LabUnit,
    shift: ShiftType,
    req: CoverageRequirement,
) {
    while !req.is_satisfied(ledger.count(unit, shift)) {
        let mut moved = vec![false; scheduler.staff.len()];
        if !augment(scheduler, day, ledger, unit, shift, &mut moved) {
            break;
        }
        debug!(%unit, %shift, date = %day.date, "deficient cell covered by moving staff");
    }
}

/// Ajoute une personne sur `(unit, shift)`, en déplaçant d'autres le long
/// d'une chaîne si besoin. Ledger inchangé en cas d'échec.
fn augment(
    scheduler: &Scheduler<'_>,
    day: &Day,
    ledger: &mut DayLedger,
    unit: LabUnit,
    shift: ShiftType,
    moved: &mut [bool],
) -> bool {
    let free = relaxed_pool(scheduler, ledger, unit, shift);
    if free.into_iter().any(|staff| {
        scheduler
            .try_place(ledger, day, staff, shift, Some(unit), Source::Relaxed)
            .is_ok()
    }) {
        return true;
    }

    for donor in donors(scheduler, ledger, unit, shift) {
        if moved[donor] {
            continue;
        }
        moved[donor] = true;
        let Some(previous) = ledger.release(donor) else {
            continue;
        };
        let Some(prev_unit) = previous.unit else {
            ledger.place(donor, previous);
            continue;
        };
        if scheduler
            .try_place(ledger, day, donor, shift, Some(unit), Source::Relaxed)
            .is_err()
        {
            ledger.place(donor, previous);
            continue;
        }

        let prev_req = scheduler.config.coverage.lookup(prev_unit, day, previous.shift);
        if prev_req.is_satisfied(ledger.count(prev_unit, previous.shift))
            || augment(scheduler, day, ledger, prev_unit, previous.shift, moved)
        {
            debug!(
                staff = %scheduler.staff[donor].id,
                from = %previous.shift,
                to = %shift,
                "moved to cover deficient cell"
            );
            return true;
        }

        ledger.release(donor);
        ledger.place(donor, previous);
    }
    false
}

/// Personnes placées aujourd'hui sur un autre poste de jour, capables de prendre la cellule.
fn donors(
    scheduler: &Scheduler<'_>,
    ledger: &DayLedger,
    unit: LabUnit,
    shift: ShiftType,
) -> Vec<usize> {
    (0..scheduler.staff.len())
        .filter(|&staff| match ledger.placement(staff) {
            Some(p) => {
                p.source != Source::Forced
                    && p.shift != ShiftType::Night
                    && p.unit.is_some()
                    && (p.unit, p.shift) != (Some(unit), shift)
            }
            None => false,
        })
        .filter(|&staff| {
            scheduler.staff[staff].works_in(unit) && scheduler.registry.is_broadly_eligible(staff, shift)
        })
        .collect()
}

/// Personnes libres éligibles à la cellule, moins chargées d'abord, puis par id.
fn relaxed_pool(
    scheduler: &Scheduler<'_>,
    ledger: &DayLedger,
    unit: LabUnit,
    shift: ShiftType,
) -> Vec<usize> {
    let mut pool: Vec<(u32, usize)> = ledger
        .free_staff()
        .filter(|&staff| {
            scheduler.staff[staff].works_in(unit) && scheduler.registry.is_broadly_eligible(staff, shift)
        })
        .map(|staff| (scheduler.load(staff, shift), staff))
        .collect();
    pool.sort_unstable();
    pool.into_iter().map(|(_, staff)| staff).collect()
}
