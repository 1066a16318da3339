#![forbid(unsafe_code)]
use chrono::NaiveDate;
use labroster::{
    config::parse_config,
    coverage::{CoverageDay, CoverageTable},
    generate_roster,
    scheduler::DiagnosticKind,
    validate_roster, Horizon, InvariantKind, LabUnit, LeaveRecord, PredominanceCategory,
    RosterCell, RosterConfig, ShiftType, Staff, WeekendPreference,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Monday.
fn monday() -> NaiveDate {
    date(2026, 2, 2)
}

fn night_staff() -> Vec<Staff> {
    ["N1", "N2", "N3"]
        .iter()
        .map(|code| Staff::new(code, format!("Night {code}"), PredominanceCategory::NightPredominant))
        .collect()
}

fn one_night_per_day() -> RosterConfig {
    let coverage = CoverageTable::new()
        .require(LabUnit::Main, CoverageDay::DAILY, ShiftType::Night, 1, Some(1))
        .unwrap();
    RosterConfig::with_coverage(coverage)
}

#[test]
fn night_cover_over_four_weeks() {
    let horizon = Horizon::new(monday(), 28).unwrap();
    let outcome = generate_roster(&night_staff(), &[], &horizon, &one_night_per_day());

    assert!(outcome.deficiencies.is_empty(), "{:?}", outcome.deficiencies);
    assert!(outcome.violations.is_empty(), "{:?}", outcome.violations);
    assert!(outcome.is_complete());

    let m = &outcome.matrix;
    for day in 0..m.day_count() {
        let nights = m
            .column(day)
            .filter(|(_, c)| *c == RosterCell::duty(ShiftType::Night, LabUnit::Main))
            .count();
        assert_eq!(nights, 1, "day {day}");
    }

    // lowest identifier opens the first pair
    let n1 = m.row(0);
    assert_eq!(n1[0], RosterCell::duty(ShiftType::Night, LabUnit::Main));
    assert_eq!(n1[1], RosterCell::duty(ShiftType::Night, LabUnit::Main));
    assert_eq!(n1[2], RosterCell::short_day());
    assert_eq!(n1[3], RosterCell::off());
    // next pair goes to the least-loaded staff member
    assert!(m.row(1)[2].is(ShiftType::Night));
    assert!(m.row(2)[4].is(ShiftType::Night));

    let total: u32 = outcome.summary.night_counts.values().sum();
    assert_eq!(total, 28);
}

#[test]
fn every_pair_is_followed_by_recovery() {
    let horizon = Horizon::new(monday(), 28).unwrap();
    let outcome = generate_roster(&night_staff(), &[], &horizon, &one_night_per_day());

    for idx in 0..outcome.matrix.staff.len() {
        let row = outcome.matrix.row(idx);
        for d in 1..row.len() {
            if row[d].is(ShiftType::Night) && row[d - 1].is(ShiftType::Night) {
                if let Some(next) = row.get(d + 1) {
                    assert!(next.is(ShiftType::ShortDay));
                }
                if let Some(after) = row.get(d + 2) {
                    assert!(after.is(ShiftType::DayOff));
                }
                if d >= 2 {
                    assert!(!row[d - 2].is(ShiftType::Night));
                }
            }
        }
    }
}

#[test]
fn leave_blocks_a_pair_that_would_overlap_it() {
    // N1 away on days 5-6 (indices 4 and 5)
    let leave = vec![LeaveRecord::new("N1", date(2026, 2, 6), date(2026, 2, 7))];
    let horizon = Horizon::new(monday(), 14).unwrap();
    let outcome = generate_roster(&night_staff(), &leave, &horizon, &one_night_per_day());

    assert!(outcome.violations.is_empty(), "{:?}", outcome.violations);
    assert!(outcome
        .diagnostics
        .iter()
        .all(|d| d.kind != DiagnosticKind::RotationInterrupted));

    let n1 = outcome.matrix.row(0);
    assert_eq!(n1[4], RosterCell::Absent);
    assert_eq!(n1[5], RosterCell::Absent);
    for start in 1..=5 {
        let opens = n1[start].is(ShiftType::Night) && !n1[start - 1].is(ShiftType::Night);
        assert!(!opens, "pair opened on day {start} despite leave");
    }
}

#[test]
fn strict_oh_never_covers_pm() {
    let staff = vec![
        Staff::new("S1", "Strict One", PredominanceCategory::StrictOh),
        Staff::new("S2", "Strict Two", PredominanceCategory::StrictOh),
    ];
    let coverage = CoverageTable::new()
        .require(LabUnit::Main, CoverageDay::WEEKDAYS, ShiftType::Pm, 3, None)
        .unwrap();
    let horizon = Horizon::new(monday(), 7).unwrap();
    let outcome = generate_roster(&staff, &[], &horizon, &RosterConfig::with_coverage(coverage));

    for idx in 0..2 {
        assert!(outcome.matrix.row(idx).iter().all(|c| !c.is(ShiftType::Pm)));
    }
    assert_eq!(outcome.deficiencies.len(), 5);
    assert!(outcome
        .deficiencies
        .iter()
        .all(|d| d.shift == ShiftType::Pm && d.assigned == 0 && d.required == 3));
    assert!(outcome.is_exportable());
}

#[test]
fn unfillable_coverage_is_reported_not_forced() {
    let staff = vec![Staff::new("N1", "Only Night", PredominanceCategory::NightPredominant)];
    let coverage = CoverageTable::new()
        .require(LabUnit::Main, CoverageDay::DAILY, ShiftType::Night, 2, None)
        .unwrap();
    let horizon = Horizon::new(monday(), 4).unwrap();
    let outcome = generate_roster(&staff, &[], &horizon, &RosterConfig::with_coverage(coverage));

    assert!(outcome.violations.is_empty(), "{:?}", outcome.violations);
    let assigned: Vec<u32> = outcome.deficiencies.iter().map(|d| d.assigned).collect();
    assert_eq!(assigned, vec![1, 1, 0, 0]);
    assert!(!outcome.is_complete());
}

#[test]
fn leave_always_wins() {
    let staff = vec![
        Staff::new("A1", "Alpha", PredominanceCategory::General),
        Staff::new("B1", "Beta", PredominanceCategory::General),
    ];
    let leave = vec![LeaveRecord::new("A1", date(2026, 1, 28), date(2026, 2, 4))];
    let coverage = CoverageTable::new()
        .require(LabUnit::Main, CoverageDay::WEEKDAYS, ShiftType::Oh, 2, None)
        .unwrap();
    let horizon = Horizon::new(monday(), 5).unwrap();
    let outcome = generate_roster(&staff, &leave, &horizon, &RosterConfig::with_coverage(coverage));

    let a1 = outcome.matrix.row(0);
    assert_eq!(&a1[..3], &[RosterCell::Absent; 3]);
    assert!(a1[3].is(ShiftType::Oh));
    assert_eq!(outcome.deficiencies.len(), 3);
    assert!(outcome.violations.is_empty());
}

#[test]
fn identical_inputs_give_identical_output() {
    let mut staff = night_staff();
    staff.push(Staff::new("E1", "Emd", PredominanceCategory::EmdPredominant));
    staff.push(Staff::new("P1", "Pm", PredominanceCategory::PmPredominant));
    let coverage = CoverageTable::new()
        .require(LabUnit::Main, CoverageDay::DAILY, ShiftType::Night, 1, Some(1))
        .unwrap()
        .require(LabUnit::Emergency, CoverageDay::WEEKDAYS, ShiftType::Emd, 1, None)
        .unwrap();
    let config = RosterConfig::with_coverage(coverage);
    let leave = vec![LeaveRecord::new("N2", date(2026, 2, 10), date(2026, 2, 12))];
    let horizon = Horizon::month(2026, 2).unwrap();

    let first = generate_roster(&staff, &leave, &horizon, &config);
    let second = generate_roster(&staff, &leave, &horizon, &config);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );

    // input order does not matter either
    staff.reverse();
    let reversed = generate_roster(&staff, &leave, &horizon, &config);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&reversed).unwrap()
    );
}

#[test]
fn emd_cover_alternates_by_load() {
    let staff = vec![
        Staff::new("E1", "Emd One", PredominanceCategory::EmdPredominant),
        Staff::new("E2", "Emd Two", PredominanceCategory::EmdPredominant),
    ];
    let coverage = CoverageTable::new()
        .require(LabUnit::Emergency, CoverageDay::WEEKDAYS, ShiftType::Emd, 1, Some(1))
        .unwrap();
    let horizon = Horizon::new(monday(), 2).unwrap();
    let outcome = generate_roster(&staff, &[], &horizon, &RosterConfig::with_coverage(coverage));

    let m = &outcome.matrix;
    assert_eq!(m.cell(0, 0), RosterCell::duty(ShiftType::Emd, LabUnit::Emergency));
    assert_eq!(m.cell(1, 0), RosterCell::duty(ShiftType::Oh, LabUnit::Main));
    assert_eq!(m.cell(1, 1), RosterCell::duty(ShiftType::Emd, LabUnit::Emergency));
    assert_eq!(m.cell(0, 1), RosterCell::duty(ShiftType::Oh, LabUnit::Main));
}

#[test]
fn relaxed_pass_fills_outside_ranking() {
    let staff = vec![Staff::new("E1", "Emd", PredominanceCategory::EmdPredominant)];
    let coverage = CoverageTable::new()
        .require(LabUnit::Main, CoverageDay::WEEKEND, ShiftType::Pm, 1, None)
        .unwrap();
    let horizon = Horizon::new(monday(), 7).unwrap();
    let outcome = generate_roster(&staff, &[], &horizon, &RosterConfig::with_coverage(coverage));

    assert!(outcome.deficiencies.is_empty());
    assert_eq!(outcome.summary.relaxed_assignments, 2);
    assert_eq!(outcome.matrix.cell(0, 5), RosterCell::duty(ShiftType::Pm, LabUnit::Main));
    assert_eq!(outcome.matrix.cell(0, 6), RosterCell::duty(ShiftType::Pm, LabUnit::Main));
}

#[test]
fn swap_moves_day_staff_and_backfills() {
    let staff = vec![
        Staff::new("E1", "Emd Both", PredominanceCategory::EmdPredominant),
        Staff::new("E2", "Emd Only", PredominanceCategory::EmdPredominant)
            .with_units([LabUnit::Emergency]),
        Staff::new("S1", "Shuffle", PredominanceCategory::OhWeekdayPmWeekendShuffle),
    ];
    let coverage = CoverageTable::new()
        .require(LabUnit::Main, [CoverageDay::Mon], ShiftType::Pm, 1, None)
        .unwrap()
        .require(LabUnit::Emergency, [CoverageDay::Mon], ShiftType::Emd, 2, None)
        .unwrap();
    let horizon = Horizon::new(monday(), 1).unwrap();
    let outcome = generate_roster(&staff, &[], &horizon, &RosterConfig::with_coverage(coverage));

    assert!(outcome.deficiencies.is_empty(), "{:?}", outcome.deficiencies);
    assert!(outcome.violations.is_empty(), "{:?}", outcome.violations);
    let m = &outcome.matrix;
    assert_eq!(m.cell(0, 0), RosterCell::duty(ShiftType::Emd, LabUnit::Emergency));
    assert_eq!(m.cell(1, 0), RosterCell::duty(ShiftType::Emd, LabUnit::Emergency));
    assert_eq!(m.cell(2, 0), RosterCell::duty(ShiftType::Pm, LabUnit::Main));
}

#[test]
fn chained_moves_cover_every_cell() {
    use PredominanceCategory as C;
    let staff = vec![
        Staff::new("A1", "Main and Emergency", C::EmdPredominant)
            .with_units([LabUnit::Main, LabUnit::Emergency]),
        Staff::new("B1", "Main only", C::EmdPredominant).with_units([LabUnit::Main]),
        Staff::new("C1", "TB and Emergency", C::EmdPredominant)
            .with_units([LabUnit::Tb, LabUnit::Emergency]),
        Staff::new("D1", "BIMA and TB", C::BimaPredominant)
            .with_units([LabUnit::Bima, LabUnit::Tb]),
    ];
    let mon = [CoverageDay::Mon];
    let coverage = CoverageTable::new()
        .require(LabUnit::Main, mon, ShiftType::Pm, 1, None)
        .unwrap()
        .require(LabUnit::Emergency, mon, ShiftType::Emd, 1, None)
        .unwrap()
        .require(LabUnit::Tb, mon, ShiftType::Oh, 1, None)
        .unwrap()
        .require(LabUnit::Bima, mon, ShiftType::Bima, 1, None)
        .unwrap();
    let horizon = Horizon::new(monday(), 1).unwrap();
    let outcome = generate_roster(&staff, &[], &horizon, &RosterConfig::with_coverage(coverage));

    // TB/OH is only reachable through C1 -> TB, A1 -> EMD, B1 -> PM
    assert!(outcome.deficiencies.is_empty(), "{:?}", outcome.deficiencies);
    assert!(outcome.violations.is_empty(), "{:?}", outcome.violations);
    let m = &outcome.matrix;
    assert_eq!(m.cell(0, 0), RosterCell::duty(ShiftType::Emd, LabUnit::Emergency));
    assert_eq!(m.cell(1, 0), RosterCell::duty(ShiftType::Pm, LabUnit::Main));
    assert_eq!(m.cell(2, 0), RosterCell::duty(ShiftType::Oh, LabUnit::Tb));
    assert_eq!(m.cell(3, 0), RosterCell::duty(ShiftType::Bima, LabUnit::Bima));
}

#[test]
fn holidays_use_sunday_cover_unless_listed() {
    let staff = vec![Staff::new("G1", "General", PredominanceCategory::General)];
    let holiday = date(2026, 2, 4);
    let sunday = date(2026, 2, 8);
    let horizon = Horizon::new(monday(), 7).unwrap().with_holidays([holiday]);

    let sunday_only = parse_config(
        r#"{ "coverage": [ { "unit": "main", "shift": "OH", "days": ["sun"], "min": 2 } ] }"#,
    )
    .unwrap();
    let outcome = generate_roster(&staff, &[], &horizon, &sunday_only);
    let short: Vec<(NaiveDate, u32, u32)> = outcome
        .deficiencies
        .iter()
        .map(|d| (d.date, d.required, d.assigned))
        .collect();
    assert_eq!(short, vec![(holiday, 2, 1), (sunday, 2, 1)]);
    assert!(outcome.violations.is_empty(), "{:?}", outcome.violations);
    assert!(outcome.matrix.cell(0, 2).is(ShiftType::Oh));

    // without the reported deficiencies the validator flags both days
    let found = validate_roster(&outcome.matrix, &staff, &[], &horizon, &sunday_only, &[])
        .unwrap_err();
    let gaps: Vec<NaiveDate> = found
        .iter()
        .filter(|v| v.invariant == InvariantKind::CoverageMinimum)
        .map(|v| v.date)
        .collect();
    assert_eq!(gaps, vec![holiday, sunday]);

    let with_holiday = parse_config(
        r#"{
            "coverage": [
                { "unit": "main", "shift": "OH", "days": ["sun"], "min": 2 },
                { "unit": "main", "shift": "OH", "days": ["holiday"], "min": 1 }
            ]
        }"#,
    )
    .unwrap();
    let outcome = generate_roster(&staff, &[], &horizon, &with_holiday);
    let dates: Vec<NaiveDate> = outcome.deficiencies.iter().map(|d| d.date).collect();
    assert_eq!(dates, vec![sunday]);
    assert!(outcome.matrix.cell(0, 2).is(ShiftType::Oh));
    assert!(outcome.violations.is_empty(), "{:?}", outcome.violations);
    assert!(validate_roster(
        &outcome.matrix,
        &staff,
        &[],
        &horizon,
        &with_holiday,
        &outcome.deficiencies
    )
    .is_ok());
}

#[test]
fn weekend_tags_and_holidays() {
    let staff = vec![
        Staff::new("P1", "Shuffle", PredominanceCategory::OhWeekdayPmWeekendShuffle),
        Staff::new("S1", "Saturday", PredominanceCategory::StrictOh)
            .with_weekend(WeekendPreference::SaturdayOnly),
    ];
    let horizon = Horizon::new(monday(), 14)
        .unwrap()
        .with_holidays([date(2026, 2, 4)]);
    let outcome = generate_roster(&staff, &[], &horizon, &RosterConfig::default());
    let m = &outcome.matrix;

    // alternating weekend day: Saturday in week 0, Sunday in week 1
    assert!(m.cell(0, 5).is(ShiftType::Pm));
    assert!(m.cell(0, 6).is(ShiftType::DayOff));
    assert!(m.cell(0, 12).is(ShiftType::DayOff));
    assert!(m.cell(0, 13).is(ShiftType::Pm));

    assert!(m.cell(1, 1).is(ShiftType::Oh));
    // holiday follows Sunday rules
    assert!(m.cell(1, 2).is(ShiftType::DayOff));
    assert!(m.cell(1, 5).is(ShiftType::Oh));
    assert!(m.cell(1, 6).is(ShiftType::DayOff));
    assert!(outcome.violations.is_empty());
}

#[test]
fn bad_inputs_become_diagnostics() {
    let mut staff = night_staff();
    staff.push(Staff::new("N1", "Duplicate", PredominanceCategory::General));
    let leave = vec![
        LeaveRecord::new("N2", date(2026, 2, 9), date(2026, 2, 3)),
        LeaveRecord::new("GHOST", date(2026, 2, 3), date(2026, 2, 4)),
    ];
    let horizon = Horizon::new(monday(), 7).unwrap();
    let outcome = generate_roster(&staff, &leave, &horizon, &one_night_per_day());

    let kinds: Vec<DiagnosticKind> = outcome.diagnostics.iter().map(|d| d.kind).collect();
    assert!(kinds.contains(&DiagnosticKind::DuplicateStaff));
    assert!(kinds.contains(&DiagnosticKind::InvalidLeaveRange));
    assert!(kinds.contains(&DiagnosticKind::UnknownStaff));
    assert_eq!(outcome.matrix.staff.len(), 3);
    assert!(outcome.violations.is_empty());
}

#[test]
fn full_lab_month_with_one_night_slot() {
    use PredominanceCategory as C;
    let mut staff: Vec<Staff> = (1..=13)
        .map(|i| Staff::new(format!("S{i:02}"), "Strict", C::StrictOh))
        .collect();
    staff.extend((1..=5).map(|i| Staff::new(format!("E{i}"), "Emergency", C::EmdPredominant)));
    staff.extend((1..=3).map(|i| Staff::new(format!("P{i}"), "Afternoon", C::PmPredominant)));
    staff.extend(night_staff());
    staff.extend((1..=2).map(|i| Staff::new(format!("B{i}"), "Bima", C::BimaPredominant)));

    let horizon = Horizon::new(monday(), 28).unwrap();
    let outcome = generate_roster(&staff, &[], &horizon, &one_night_per_day());

    assert!(outcome.deficiencies.is_empty(), "{:?}", outcome.deficiencies);
    assert!(outcome.violations.is_empty(), "{:?}", outcome.violations);

    let n1 = labroster::StaffId::new("N1");
    let cell = |d: u32| outcome.matrix.get(&n1, date(2026, 2, d)).unwrap();
    assert_eq!(cell(2), RosterCell::duty(ShiftType::Night, LabUnit::Main));
    assert_eq!(cell(3), RosterCell::duty(ShiftType::Night, LabUnit::Main));
    assert_eq!(cell(4), RosterCell::short_day());
    assert_eq!(cell(5), RosterCell::off());

    let first_day_nights: Vec<_> = outcome
        .matrix
        .column(0)
        .filter(|(_, c)| c.is(ShiftType::Night))
        .collect();
    assert_eq!(first_day_nights.len(), 1);

    for (idx, member) in outcome.matrix.staff.iter().enumerate() {
        if member.as_str().starts_with('S') {
            assert!(outcome
                .matrix
                .row(idx)
                .iter()
                .all(|c| !c.is(ShiftType::Pm) && !c.is(ShiftType::Emd) && !c.is(ShiftType::Bima)));
        }
    }
}
