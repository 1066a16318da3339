//! Validation : revérifie un planning terminé contre chaque invariant dur.

use super::types::{CoverageDeficiency, InvariantKind, InvariantViolation, ValidationResult};
use crate::calendar::{resolve_leave, Horizon};
use crate::config::RosterConfig;
use crate::model::{LeaveRecord, RosterCell, RosterMatrix, ShiftType, Staff, StaffId};
use crate::preference::PreferenceRegistry;
use chrono::NaiveDate;

/// Valide `matrix` indépendamment de la façon dont il a été produit.
///
/// Une cellule sous son minimum n'est acceptée que si elle figure dans
/// `deficiencies`. `Ok` vide : le planning peut être exporté.
pub fn validate_roster(
    matrix: &RosterMatrix,
    staff: &[Staff],
    leave: &[LeaveRecord],
    horizon: &Horizon,
    config: &RosterConfig,
    deficiencies: &[CoverageDeficiency],
) -> ValidationResult {
    let mut out = Vec::new();

    let members: Vec<Option<&Staff>> = matrix
        .staff
        .iter()
        .map(|id| staff.iter().find(|s| &s.id == id))
        .collect();
    let known: Vec<Staff> = members.iter().flatten().map(|s| (*s).clone()).collect();
    let registry = PreferenceRegistry::build(&known, &config.rankings);
    let (availability, _) = resolve_leave(horizon, &matrix.staff, leave);
    let days = matrix.day_count().min(horizon.len());

    let mut known_idx = 0usize;
    for (idx, member) in members.iter().enumerate() {
        let id = &matrix.staff[idx];
        let row = &matrix.row(idx)[..days];
        let Some(member) = member else {
            out.push(violation(
                InvariantKind::Eligibility,
                Some(id),
                matrix.dates.first().copied().unwrap_or(horizon.start()),
                "staff not in roster input".into(),
            ));
            continue;
        };
        let profile = known_idx;
        known_idx += 1;

        check_rotation(row, id, &matrix.dates, &mut out);

        for (day, cell) in row.iter().enumerate() {
            let date = matrix.dates[day];
            let on_leave = availability.is_on_leave(idx, day);
            match (on_leave, cell) {
                (true, RosterCell::Absent) => {}
                (true, other) => out.push(violation(
                    InvariantKind::LeavePrecedence,
                    Some(id),
                    date,
                    format!("{} during leave", code(other)),
                )),
                (false, RosterCell::Absent) => out.push(violation(
                    InvariantKind::LeavePrecedence,
                    Some(id),
                    date,
                    "A without leave".into(),
                )),
                (false, RosterCell::Unassigned) => out.push(violation(
                    InvariantKind::UnassignedCell,
                    Some(id),
                    date,
                    "unassigned".into(),
                )),
                (false, &RosterCell::Duty { shift, unit }) => {
                    if shift.is_recovery() {
                        continue;
                    }
                    if member.is_excluded(shift) {
                        out.push(violation(
                            InvariantKind::HardExclusion,
                            Some(id),
                            date,
                            shift.code().into(),
                        ));
                        continue;
                    }
                    let unit_ok = unit.is_some_and(|u| member.works_in(u) && shift.applies_to(u));
                    if !unit_ok || !registry.is_broadly_eligible(profile, shift) {
                        let at = unit.map_or("-", |u| u.code());
                        out.push(violation(
                            InvariantKind::Eligibility,
                            Some(id),
                            date,
                            format!("{shift}@{at}"),
                        ));
                    }
                }
            }
        }
    }

    for day in horizon.days().take(days) {
        for (unit, shift, req) in config.coverage.requirements_for(&day) {
            if req.min == 0 {
                continue;
            }
            let count = matrix
                .column(day.index)
                .filter(|(_, cell)| cell.is(shift) && cell.unit() == Some(unit))
                .count() as u32;
            let reported = deficiencies
                .iter()
                .any(|d| d.date == day.date && d.unit == unit && d.shift == shift);
            if !req.is_satisfied(count) && !reported {
                out.push(violation(
                    InvariantKind::CoverageMinimum,
                    None,
                    day.date,
                    format!("{unit}/{shift}: {count} of {}", req.min),
                ));
            }
        }
    }

    if out.is_empty() {
        Ok(())
    } else {
        Err(out)
    }
}

/// N → N → SD → DO, atomique. Une séquence coupée par le bord de l'horizon est acceptée.
fn check_rotation(row: &[RosterCell], id: &StaffId, dates: &[NaiveDate], out: &mut Vec<InvariantViolation>) {
    let night = |d: usize| row.get(d).is_some_and(|c| c.is(ShiftType::Night));

    for (d, cell) in row.iter().enumerate() {
        if cell.is(ShiftType::Night) {
            let second = d > 0 && night(d - 1);
            if second {
                if d >= 2 && night(d - 2) {
                    out.push(violation(InvariantKind::RotationLaw, Some(id), dates[d], "N,N,N".into()));
                }
                if let Some(next) = row.get(d + 1) {
                    if !next.is(ShiftType::ShortDay) {
                        out.push(violation(
                            InvariantKind::RotationLaw,
                            Some(id),
                            dates[d + 1],
                            format!("N,N,{}", code(next)),
                        ));
                    }
                }
                if let Some(after) = row.get(d + 2) {
                    if !after.is(ShiftType::DayOff) {
                        out.push(violation(
                            InvariantKind::RotationLaw,
                            Some(id),
                            dates[d + 2],
                            format!("N,N,SD,{}", code(after)),
                        ));
                    }
                }
            } else if let Some(next) = row.get(d + 1) {
                if !next.is(ShiftType::Night) {
                    out.push(violation(
                        InvariantKind::RotationLaw,
                        Some(id),
                        dates[d + 1],
                        format!("N,{}", code(next)),
                    ));
                }
            }
        }
        if cell.is(ShiftType::ShortDay) && !(d >= 2 && night(d - 1) && night(d - 2)) {
            out.push(violation(
                InvariantKind::RotationLaw,
                Some(id),
                dates[d],
                "SD outside rotation".into(),
            ));
        }
    }
}

fn code(cell: &RosterCell) -> &'static str {
    match cell {
        RosterCell::Unassigned => "-",
        other => other.code(),
    }
}

fn violation(
    invariant: InvariantKind,
    staff: Option<&StaffId>,
    date: NaiveDate,
    observed: String,
) -> InvariantViolation {
    InvariantViolation {
        invariant,
        staff: staff.cloned(),
        date,
        observed,
    }
}
