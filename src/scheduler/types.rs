use crate::calendar::CalendarError;
use crate::model::{LabUnit, RosterMatrix, ShiftType, StaffId};
use crate::rotation::RotationViolation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Cellule restée sous son minimum après les replis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageDeficiency {
    pub date: NaiveDate,
    pub unit: LabUnit,
    pub shift: ShiftType,
    pub required: u32,
    pub assigned: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantKind {
    RotationLaw,
    LeavePrecedence,
    CoverageMinimum,
    HardExclusion,
    Eligibility,
    UnassignedCell,
}

/// Invariant violé dans un planning terminé.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantViolation {
    pub invariant: InvariantKind,
    pub staff: Option<StaffId>,
    pub date: NaiveDate,
    pub observed: String,
}

/// `Ok(())` si tous les invariants tiennent.
pub type ValidationResult = Result<(), Vec<InvariantViolation>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    InvalidLeaveRange,
    UnknownStaff,
    DuplicateStaff,
    RotationInterrupted,
}

/// Avertissement non fatal (entrées ou moteur).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(default)]
    pub staff: Option<StaffId>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub message: String,
}

impl From<CalendarError> for Diagnostic {
    fn from(err: CalendarError) -> Self {
        let (kind, staff, date) = match &err {
            CalendarError::InvalidLeaveRange { staff, start, .. } => {
                (DiagnosticKind::InvalidLeaveRange, Some(staff.clone()), Some(*start))
            }
            CalendarError::UnknownStaff(staff) => {
                (DiagnosticKind::UnknownStaff, Some(staff.clone()), None)
            }
            CalendarError::InvalidHorizon(_) => (DiagnosticKind::InvalidLeaveRange, None, None),
        };
        Self {
            kind,
            staff,
            date,
            message: err.to_string(),
        }
    }
}

/// Raison du refus d'une tentative de placement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssignError {
    #[error("staff already holds a cell today")]
    AlreadyAssigned,
    #[error("staff is on leave")]
    OnLeave,
    #[error("{0} is hard-excluded for this staff")]
    HardExclusion(ShiftType),
    #[error("staff does not work in unit {0}")]
    UnitIneligible(LabUnit),
    #[error("night pair would overlap leave")]
    NightWindowBlocked,
    #[error(transparent)]
    Rotation(#[from] RotationViolation),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSummary {
    /// Nombre de cellules par code (`OH`, `N`, `A`, ...).
    pub shift_distribution: BTreeMap<String, u32>,
    /// Nuits par personne.
    pub night_counts: BTreeMap<StaffId, u32>,
    /// Cellules de libre choix ayant obtenu le premier candidat.
    pub preference_hits: u32,
    /// Places de couverture pourvues hors ordre de préférence.
    pub relaxed_assignments: u32,
}

/// Tout ce que produit `generate_roster`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterOutcome {
    pub matrix: RosterMatrix,
    pub deficiencies: Vec<CoverageDeficiency>,
    pub violations: Vec<InvariantViolation>,
    pub diagnostics: Vec<Diagnostic>,
    pub summary: RosterSummary,
}

impl RosterOutcome {
    /// Un planning avec violations d'invariants ne doit pas être exporté.
    pub fn is_exportable(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.violations.is_empty() && self.deficiencies.is_empty()
    }
}
