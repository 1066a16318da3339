use super::types::{AssignError, CoverageDeficiency, Diagnostic, DiagnosticKind};
use super::util::{DayLedger, Placement, Source};
use super::{backtrack, Scheduler};
use crate::calendar::Day;
use crate::coverage::CoverageRequirement;
use crate::model::{LabUnit, RosterCell, ShiftType};
use crate::rotation::ROTATION_SPAN;
use tracing::{debug, warn};

/// Affecte chaque jour de l'horizon, dans l'ordre chronologique.
pub(super) fn assign_horizon(scheduler: &mut Scheduler<'_>) {
    let days: Vec<Day> = scheduler.horizon.days().collect();
    for day in &days {
        let mut ledger = DayLedger::new(scheduler.staff.len());
        mark_leave(scheduler, day, &mut ledger);
        apply_forced(scheduler, &mut ledger);
        fill_coverage(scheduler, day, &mut ledger);
        fill_free_choice(scheduler, day, &mut ledger);
        commit_day(scheduler, day, &ledger);
    }
}

fn mark_leave(scheduler: &Scheduler<'_>, day: &Day, ledger: &mut DayLedger) {
    for staff in 0..scheduler.staff.len() {
        if scheduler.availability.is_on_leave(staff, day.index) {
            ledger.mark_absent(staff);
        }
    }
}

/// Les étapes de rotation en attente passent avant tout le reste.
fn apply_forced(scheduler: &Scheduler<'_>, ledger: &mut DayLedger) {
    for staff in 0..scheduler.staff.len() {
        if !ledger.is_free(staff) {
            continue;
        }
        let Some(shift) = scheduler.tracker.next_forced_shift(staff) else {
            continue;
        };
        let unit = match shift {
            ShiftType::Night => scheduler.tracker.night_unit(staff),
            _ => None,
        };
        ledger.place(
            staff,
            Placement {
                shift,
                unit,
                source: Source::Forced,
            },
        );
    }
}

fn fill_coverage(scheduler: &mut Scheduler<'_>, day: &Day, ledger: &mut DayLedger) {
    let mut open: Vec<(usize, LabUnit, ShiftType, CoverageRequirement)> = scheduler
        .config
        .coverage
        .requirements_for(day)
        .into_iter()
        .filter(|(unit, shift, req)| !req.is_satisfied(ledger.count(*unit, *shift)))
        .map(|(unit, shift, req)| (scheduler.pool_size(ledger, unit, shift), unit, shift, req))
        .collect();
    // cellules les plus contraintes d'abord
    open.sort_by_key(|(pool, unit, shift, _)| (*pool, *unit, *shift));

    for (_, unit, shift, req) in open {
        fill_preferred(scheduler, day, ledger, unit, shift, req);
        if !req.is_satisfied(ledger.count(unit, shift)) {
            backtrack::relaxed_fill(scheduler, day, ledger, unit, shift, req);
        }
        if !req.is_satisfied(ledger.count(unit, shift)) {
            backtrack::swap_fill(scheduler, day, ledger, unit, shift, req);
        }

        let assigned = ledger.count(unit, shift);
        if !req.is_satisfied(assigned) {
            warn!(
                date = %day.date,
                %unit,
                %shift,
                required = req.min,
                assigned,
                "coverage deficiency"
            );
            scheduler.deficiencies.push(CoverageDeficiency {
                date: day.date,
                unit,
                shift,
                required: req.min,
                assigned,
            });
        }
    }
}

/// Remplit une cellule avec ceux qui classent `shift` aujourd'hui, meilleur rang d'abord.
fn fill_preferred(
    scheduler: &mut Scheduler<'_>,
    day: &Day,
    ledger: &mut DayLedger,
    unit: LabUnit,
    shift: ShiftType,
    req: CoverageRequirement,
) {
    let mut ranked: Vec<(usize, u32, usize)> = ledger
        .free_staff()
        .filter(|&staff| scheduler.staff[staff].works_in(unit))
        .filter_map(|staff| {
            let rank = scheduler.registry.rank(staff, day, shift)?;
            Some((rank, scheduler.load(staff, shift), staff))
        })
        .collect();
    ranked.sort_unstable();

    for (_, _, staff) in ranked {
        if req.is_satisfied(ledger.count(unit, shift)) {
            break;
        }
        if let Err(err) = scheduler.try_place(ledger, day, staff, shift, Some(unit), Source::Preferred) {
            debug!(staff = %scheduler.staff[staff].id, %shift, %err, "preferred candidate refused");
        }
    }
}

/// Chaque personne encore libre reçoit son meilleur candidat ayant de la
/// place, sinon DO. Une paire de nuits n'est lancée que pour la couverture.
fn fill_free_choice(scheduler: &mut Scheduler<'_>, day: &Day, ledger: &mut DayLedger) {
    let free: Vec<usize> = ledger.free_staff().collect();
    for staff in free {
        let candidates = scheduler.registry.candidates(staff, day).to_vec();
        let placed = candidates
            .iter()
            .enumerate()
            .filter(|(_, shift)| **shift != ShiftType::Night)
            .find(|(_, shift)| scheduler.place_anywhere(ledger, day, staff, **shift))
            .map(|(rank, _)| rank);

        match placed {
            Some(0) => scheduler.summary.preference_hits += 1,
            Some(_) => {}
            None => ledger.place(
                staff,
                Placement {
                    shift: ShiftType::DayOff,
                    unit: None,
                    source: Source::Choice,
                },
            ),
        }
    }
}

fn commit_day(scheduler: &mut Scheduler<'_>, day: &Day, ledger: &DayLedger) {
    for staff in 0..scheduler.staff.len() {
        let cell = match ledger.placement(staff) {
            Some(p) => {
                scheduler.shift_counts[staff][p.shift.index()] += 1;
                if p.source == Source::Relaxed {
                    scheduler.summary.relaxed_assignments += 1;
                }
                RosterCell::Duty {
                    shift: p.shift,
                    unit: p.unit,
                }
            }
            None if scheduler.availability.is_on_leave(staff, day.index) => RosterCell::Absent,
            None => RosterCell::Unassigned,
        };
        scheduler.matrix.set(staff, day.index, cell);

        if let Err(err) = scheduler.tracker.record(staff, &cell) {
            let id = scheduler.staff[staff].id.clone();
            warn!(staff = %id, date = %day.date, %err, "night rotation interrupted");
            scheduler.diagnostics.push(Diagnostic {
                kind: DiagnosticKind::RotationInterrupted,
                staff: Some(id),
                date: Some(day.date),
                message: err.to_string(),
            });
        }
    }
}

impl Scheduler<'_> {
    /// Place `staff` sur `shift` aujourd'hui si toutes les règles dures le permettent.
    pub(super) fn try_place(
        &self,
        ledger: &mut DayLedger,
        day: &Day,
        staff: usize,
        shift: ShiftType,
        unit: Option<LabUnit>,
        source: Source,
    ) -> Result<(), AssignError> {
        if !ledger.is_free(staff) {
            if self.availability.is_on_leave(staff, day.index) {
                return Err(AssignError::OnLeave);
            }
            return Err(AssignError::AlreadyAssigned);
        }
        let member = &self.staff[staff];
        if member.is_excluded(shift) {
            return Err(AssignError::HardExclusion(shift));
        }
        if let Some(unit) = unit {
            if !member.works_in(unit) || !shift.applies_to(unit) {
                return Err(AssignError::UnitIneligible(unit));
            }
        }
        self.tracker.check(staff, shift)?;
        if shift == ShiftType::Night
            && self.tracker.can_start_night(staff)
            && !self
                .availability
                .is_window_clear(staff, day.index, ROTATION_SPAN)
        {
            return Err(AssignError::NightWindowBlocked);
        }

        ledger.place(
            staff,
            Placement {
                shift,
                unit,
                source,
            },
        );
        Ok(())
    }

    /// Première unité de la personne où `shift` a encore de la place.
    fn place_anywhere(
        &self,
        ledger: &mut DayLedger,
        day: &Day,
        staff: usize,
        shift: ShiftType,
    ) -> bool {
        let units: Vec<LabUnit> = self.staff[staff]
            .units
            .iter()
            .copied()
            .filter(|unit| shift.applies_to(*unit))
            .collect();
        units.into_iter().any(|unit| {
            let req = self.config.coverage.lookup(unit, day, shift);
            req.has_room(ledger.count(unit, shift))
                && self
                    .try_place(ledger, day, staff, shift, Some(unit), Source::Choice)
                    .is_ok()
        })
    }

    /// Personnes libres capables de tenir (`unit`, `shift`).
    pub(super) fn pool_size(&self, ledger: &DayLedger, unit: LabUnit, shift: ShiftType) -> usize {
        ledger
            .free_staff()
            .filter(|&staff| {
                self.staff[staff].works_in(unit) && self.registry.is_broadly_eligible(staff, shift)
            })
            .count()
    }

    pub(super) fn load(&self, staff: usize, shift: ShiftType) -> u32 {
        self.shift_counts[staff][shift.index()]
    }
}
