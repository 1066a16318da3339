mod assignment;
mod backtrack;
mod types;
mod util;
mod validate;

pub use types::{
    AssignError, CoverageDeficiency, Diagnostic, DiagnosticKind, InvariantKind,
    InvariantViolation, RosterOutcome, RosterSummary, ValidationResult,
};
pub use validate::validate_roster;

use crate::calendar::{resolve_leave, Availability, Horizon};
use crate::config::RosterConfig;
use crate::model::{LeaveRecord, RosterMatrix, ShiftType, Staff, StaffId};
use crate::preference::PreferenceRegistry;
use crate::rotation::RotationTracker;

/// Génère le planning de `horizon`.
///
/// N'échoue jamais : entrées ignorées, couverture manquante et invariants
/// violés sont tous rapportés dans le [`RosterOutcome`] renvoyé.
pub fn generate_roster(
    staff: &[Staff],
    leave: &[LeaveRecord],
    horizon: &Horizon,
    config: &RosterConfig,
) -> RosterOutcome {
    Scheduler::new(staff, leave, horizon, config).run()
}

/// Scheduler : état d'une génération, jamais partagé entre deux runs
#[derive(Debug)]
pub struct Scheduler<'a> {
    staff: Vec<Staff>,
    leave: &'a [LeaveRecord],
    horizon: &'a Horizon,
    config: &'a RosterConfig,
    availability: Availability,
    registry: PreferenceRegistry,
    tracker: RotationTracker,
    matrix: RosterMatrix,
    /// Par personne, cellules tenues jusqu'ici pour chaque type de poste.
    shift_counts: Vec<[u32; ShiftType::COUNT]>,
    deficiencies: Vec<CoverageDeficiency>,
    diagnostics: Vec<Diagnostic>,
    summary: RosterSummary,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        staff: &[Staff],
        leave: &'a [LeaveRecord],
        horizon: &'a Horizon,
        config: &'a RosterConfig,
    ) -> Self {
        let mut diagnostics = Vec::new();

        let mut ordered: Vec<Staff> = Vec::with_capacity(staff.len());
        let mut sorted: Vec<&Staff> = staff.iter().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));
        for member in sorted {
            if ordered.last().is_some_and(|prev| prev.id == member.id) {
                tracing::warn!(staff = %member.id, "duplicate staff entry ignored");
                diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::DuplicateStaff,
                    staff: Some(member.id.clone()),
                    date: None,
                    message: format!("duplicate staff id {}; first entry kept", member.id),
                });
                continue;
            }
            ordered.push(member.clone());
        }

        let ids: Vec<StaffId> = ordered.iter().map(|s| s.id.clone()).collect();
        let (availability, skipped) = resolve_leave(horizon, &ids, leave);
        diagnostics.extend(skipped.into_iter().map(Diagnostic::from));

        let registry = PreferenceRegistry::build(&ordered, &config.rankings);
        let tracker = RotationTracker::new(ordered.len());
        let shift_counts = vec![[0; ShiftType::COUNT]; ordered.len()];
        let matrix = RosterMatrix::new(ids, horizon.dates());

        Self {
            staff: ordered,
            leave,
            horizon,
            config,
            availability,
            registry,
            tracker,
            matrix,
            shift_counts,
            deficiencies: Vec::new(),
            diagnostics,
            summary: RosterSummary::default(),
        }
    }

    /// Personnel dans l'ordre moteur (id croissant, doublons retirés).
    pub fn staff(&self) -> &[Staff] {
        &self.staff
    }

    pub fn run(mut self) -> RosterOutcome {
        tracing::info!(
            staff = self.staff.len(),
            days = self.horizon.len(),
            start = %self.horizon.start(),
            "generating roster"
        );
        assignment::assign_horizon(&mut self);
        self.summarize();

        let violations = match validate_roster(
            &self.matrix,
            &self.staff,
            self.leave,
            self.horizon,
            self.config,
            &self.deficiencies,
        ) {
            Ok(()) => Vec::new(),
            Err(violations) => {
                tracing::warn!(count = violations.len(), "roster failed validation");
                violations
            }
        };

        tracing::info!(
            deficiencies = self.deficiencies.len(),
            violations = violations.len(),
            "roster generated"
        );

        RosterOutcome {
            matrix: self.matrix,
            deficiencies: self.deficiencies,
            violations,
            diagnostics: self.diagnostics,
            summary: self.summary,
        }
    }

    fn summarize(&mut self) {
        for (idx, id) in self.matrix.staff.iter().enumerate() {
            let mut nights = 0u32;
            for cell in self.matrix.row(idx) {
                *self
                    .summary
                    .shift_distribution
                    .entry(cell.code().to_string())
                    .or_insert(0) += 1;
                if cell.is(ShiftType::Night) {
                    nights += 1;
                }
            }
            if nights > 0 {
                self.summary.night_counts.insert(id.clone(), nights);
            }
        }
    }
}
