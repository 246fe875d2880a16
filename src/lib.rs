#![forbid(unsafe_code)]
//! Roulement — génération de plannings mensuels d'équipes par contraintes
//! (sans base de données).
//!
//! - Référentiel lu depuis un instantané JSON, artefacts JSON/CSV.
//! - Jours ouvrés hebdomadaires, roulement cyclique travail/repos,
//!   réparation de capacité avant modélisation.
//! - Couverture exacte, unicité journalière, enchaînements interdits,
//!   bande d'équité ; profil idéal en objectif souple.
//! - Solveur par séparation-évaluation embarqué, interchangeable via
//!   le trait [`cp::CpSolver`].
//! - Dates civiles uniquement ; aucun fuseau dans la lib.

pub mod calendar;
pub mod check;
pub mod cp;
pub mod io;
pub mod model;
pub mod planner;
pub mod repair;
pub mod rotation;
pub mod storage;

pub use check::{check_schedule, Finding};
pub use cp::{BranchBoundSolver, CpSolver, SolveStatus, SolverConfig};
pub use model::{
    Absence, AbsenceKind, Assignment, AssignmentEntry, DayOffSet, Employee, EmployeeId,
    IdealProfile, Month, MonthlySchedule, NamedProfile, OperatingConfig, RotationPlan,
    SegmentKind, ShiftCode, ShiftType, ShiftTypeId, StoreSnapshot, WorkRestSegment,
};
pub use planner::{
    Diagnostics, MonthlyPlanner, PlanError, PlanInputs, PlanOutcome, PlanStage, PlanWarning,
    PlannerOptions,
};
pub use storage::{JsonStorage, Storage};
