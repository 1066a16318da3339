#![forbid(unsafe_code)]
//! Labroster : génération du planning de service mensuel d'un laboratoire hospitalier multi-unités.
//!
//! - Personnel, congés et couverture en entrée ; matrice personne × jour de codes de poste en sortie.
//! - Rotation de nuit N → N → SD → DO atomique, jamais interrompue.
//! - Les congés priment toujours ; les exclusions dures ne sont jamais relâchées.
//! - Déterministe : mêmes entrées, sortie identique à l'octet près.
//! - Stockage fichiers (JSON/CSV), sans BD.

pub mod calendar;
pub mod config;
pub mod coverage;
pub mod io;
pub mod model;
pub mod preference;
pub mod rotation;
pub mod scheduler;
pub mod storage;

pub use calendar::{leave_for_horizon, CalendarError, Day, Horizon};
pub use config::{load_config, ConfigError, RosterConfig};
pub use coverage::{CoverageDay, CoverageRequirement, CoverageTable};
pub use model::{
    LabUnit, LeaveRecord, MatrixShapeError, PredominanceCategory, RosterCell, RosterMatrix,
    ShiftType, Staff, StaffId, WeekendPreference,
};
pub use preference::{CategoryRanking, RankingTable};
pub use rotation::{RotationTracker, RotationViolation};
pub use scheduler::{
    generate_roster, validate_roster, CoverageDeficiency, Diagnostic, InvariantKind,
    InvariantViolation, RosterOutcome, Scheduler,
};
pub use storage::{JsonStorage, Storage};
