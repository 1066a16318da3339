#![forbid(unsafe_code)]
use chrono::NaiveDate;
use labroster::{
    coverage::{CoverageDay, CoverageTable},
    scheduler::CoverageDeficiency,
    validate_roster, Horizon, InvariantKind, LabUnit, LeaveRecord, PredominanceCategory,
    RosterCell, RosterConfig, RosterMatrix, ShiftType, Staff, StaffId,
};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn matrix(staff: &[&Staff], rows: &[&[RosterCell]]) -> (RosterMatrix, Horizon) {
    let horizon = Horizon::new(start(), rows[0].len()).unwrap();
    let ids: Vec<StaffId> = staff.iter().map(|s| s.id.clone()).collect();
    let mut m = RosterMatrix::new(ids, horizon.dates());
    for (idx, row) in rows.iter().enumerate() {
        for (day, cell) in row.iter().enumerate() {
            m.set(idx, day, *cell);
        }
    }
    (m, horizon)
}

fn kinds(result: Result<(), Vec<labroster::InvariantViolation>>) -> Vec<InvariantKind> {
    result
        .err()
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.invariant)
        .collect()
}

const N: RosterCell = RosterCell::Duty {
    shift: ShiftType::Night,
    unit: Some(LabUnit::Main),
};
const OH: RosterCell = RosterCell::Duty {
    shift: ShiftType::Oh,
    unit: Some(LabUnit::Main),
};
const PM: RosterCell = RosterCell::Duty {
    shift: ShiftType::Pm,
    unit: Some(LabUnit::Main),
};
const SD: RosterCell = RosterCell::Duty {
    shift: ShiftType::ShortDay,
    unit: None,
};
const DO: RosterCell = RosterCell::Duty {
    shift: ShiftType::DayOff,
    unit: None,
};

#[test]
fn accepts_a_clean_rotation() {
    let night = Staff::new("GOD", "Night", PredominanceCategory::NightPredominant);
    let (m, h) = matrix(&[&night], &[&[N, N, SD, DO, OH]]);
    let config = RosterConfig::default();
    assert!(validate_roster(&m, &[night], &[], &h, &config, &[]).is_ok());
}

#[test]
fn rotation_cut_by_horizon_end_is_accepted() {
    let night = Staff::new("GOD", "Night", PredominanceCategory::NightPredominant);
    let (m, h) = matrix(&[&night], &[&[OH, OH, N, N]]);
    assert!(validate_roster(&m, &[night], &[], &h, &RosterConfig::default(), &[]).is_ok());
}

#[test]
fn flags_broken_rotations() {
    let night = Staff::new("GOD", "Night", PredominanceCategory::NightPredominant);
    let config = RosterConfig::default();

    let (m, h) = matrix(&[&night], &[&[N, N, OH, DO]]);
    let found = kinds(validate_roster(&m, &[night.clone()], &[], &h, &config, &[]));
    assert_eq!(found, vec![InvariantKind::RotationLaw]);

    let (m, h) = matrix(&[&night], &[&[N, OH, OH, OH]]);
    let found = kinds(validate_roster(&m, &[night.clone()], &[], &h, &config, &[]));
    assert_eq!(found, vec![InvariantKind::RotationLaw]);

    let (m, h) = matrix(&[&night], &[&[N, N, N, SD, DO]]);
    let found = kinds(validate_roster(&m, &[night.clone()], &[], &h, &config, &[]));
    assert!(found.contains(&InvariantKind::RotationLaw));

    let (m, h) = matrix(&[&night], &[&[OH, SD, DO]]);
    let found = kinds(validate_roster(&m, &[night], &[], &h, &config, &[]));
    assert_eq!(found, vec![InvariantKind::RotationLaw]);
}

#[test]
fn leave_must_match_absent_cells() {
    let general = Staff::new("MAR", "General", PredominanceCategory::General);
    let day = |d| NaiveDate::from_ymd_opt(2026, 3, d).unwrap();
    let leave = vec![LeaveRecord::new("MAR", day(3), day(3))];
    let config = RosterConfig::default();

    let (m, h) = matrix(&[&general], &[&[OH, OH, OH]]);
    let found = kinds(validate_roster(&m, &[general.clone()], &leave, &h, &config, &[]));
    assert_eq!(found, vec![InvariantKind::LeavePrecedence]);

    let (m, h) = matrix(&[&general], &[&[RosterCell::Absent, RosterCell::Absent, OH]]);
    let found = kinds(validate_roster(&m, &[general.clone()], &leave, &h, &config, &[]));
    assert_eq!(found, vec![InvariantKind::LeavePrecedence]);

    let (m, h) = matrix(&[&general], &[&[OH, RosterCell::Absent, OH]]);
    assert!(validate_roster(&m, &[general], &leave, &h, &config, &[]).is_ok());
}

#[test]
fn flags_exclusions_eligibility_and_gaps() {
    let strict = Staff::new("NJAM", "Strict", PredominanceCategory::StrictOh);
    let general = Staff::new("MAR", "General", PredominanceCategory::General);
    let config = RosterConfig::default();

    let (m, h) = matrix(
        &[&strict, &general],
        &[&[PM, OH, OH], &[OH, N, RosterCell::Unassigned]],
    );
    let found = kinds(validate_roster(&m, &[strict, general], &[], &h, &config, &[]));
    // PM for strict OH, N for staff without night eligibility
    let exclusions = found.iter().filter(|k| **k == InvariantKind::HardExclusion).count();
    assert_eq!(exclusions, 2);
    assert!(found.contains(&InvariantKind::UnassignedCell));
}

#[test]
fn unreported_coverage_gap_is_a_violation() {
    let general = Staff::new("MAR", "General", PredominanceCategory::General);
    let coverage = CoverageTable::new()
        .require(LabUnit::Main, CoverageDay::DAILY, ShiftType::Oh, 2, None)
        .unwrap();
    let config = RosterConfig::with_coverage(coverage);
    let (m, h) = matrix(&[&general], &[&[OH]]);

    let found = kinds(validate_roster(&m, &[general.clone()], &[], &h, &config, &[]));
    assert_eq!(found, vec![InvariantKind::CoverageMinimum]);

    let reported = vec![CoverageDeficiency {
        date: start(),
        unit: LabUnit::Main,
        shift: ShiftType::Oh,
        required: 2,
        assigned: 1,
    }];
    assert!(validate_roster(&m, &[general], &[], &h, &config, &reported).is_ok());
}
