//! Orchestration d'une planification mensuelle : filtrage calendaire,
//! roulement, réparation des repos, modèle de contraintes, résolution,
//! revalidation. Chaque étape est franchie dans cet ordre, exactement
//! une fois ; l'échec de l'une est définitif pour l'exécution.

mod adapter;
mod builder;
mod types;

pub use adapter::{SolveReport, SolverAdapter};
pub use builder::{ScheduleModelBuilder, VarGrid};
pub use types::{
    Diagnostics, DistributionStats, PlanError, PlanStage, PlanWarning, PlannerOptions,
};

use crate::calendar::{self, WeekdayMask};
use crate::cp::{CpSolver, SolverConfig};
use crate::model::{
    Absence, Assignment, DayOffSet, Employee, IdealProfile, Month, NamedProfile, OperatingConfig,
    ShiftCode, ShiftType, StoreSnapshot,
};
use crate::{repair, rotation};
use chrono::NaiveDate;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Entrées d'une planification, passées en valeurs explicites : le
/// planificateur ne lit ni fichier ni horloge, ce qui le rend rejouable.
#[derive(Debug, Clone)]
pub struct PlanInputs {
    pub month: Month,
    pub group: String,
    /// Employés actifs du groupe, dans l'ordre du référentiel (l'ordre
    /// détermine les décalages de roulement).
    pub employees: Vec<Employee>,
    pub shift_types: Vec<ShiftType>,
    pub config: Option<OperatingConfig>,
    pub absences: Vec<Absence>,
    pub ideal_profile: Option<NamedProfile>,
}

impl PlanInputs {
    /// Projette un instantané du référentiel sur un groupe et un mois.
    pub fn from_snapshot(
        snapshot: &StoreSnapshot,
        month: Month,
        group: &str,
        ideal_profile: Option<NamedProfile>,
    ) -> Self {
        let employees = snapshot.active_employees(group);
        let absences = snapshot
            .absences
            .iter()
            .filter(|a| employees.iter().any(|e| e.id == a.employee))
            .cloned()
            .collect();
        Self {
            month,
            group: group.to_string(),
            shift_types: snapshot.shift_types_for(group),
            config: snapshot.config_for(group).cloned(),
            employees,
            absences,
            ideal_profile,
        }
    }
}

/// Résultat d'une exécution acceptée : l'affectation complète et le
/// diagnostic machine qui l'accompagne.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub assignment: Assignment,
    pub diagnostics: Diagnostics,
}

/// Planificateur mensuel. Tout ou rien : soit une affectation couvrant
/// chaque créneau à l'effectif exact, soit une erreur typée.
#[derive(Debug)]
pub struct MonthlyPlanner {
    inputs: PlanInputs,
    options: PlannerOptions,
}

impl MonthlyPlanner {
    pub fn new(inputs: PlanInputs) -> Self {
        Self {
            inputs,
            options: PlannerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PlannerOptions) -> Self {
        self.options = options;
        self
    }

    /// Déroule les étapes sur le solveur fourni.
    pub fn run<S: CpSolver>(&self, solver: &S) -> Result<PlanOutcome, PlanError> {
        let run_id = Uuid::new_v4().to_string();
        let mut diag = Diagnostics::new(run_id);
        let inputs = &self.inputs;

        info!(group = %inputs.group, month = %inputs.month, run_id = %diag.run_id, "planning run started");

        diag.employees = inputs.employees.len();
        diag.shift_types = inputs.shift_types.len();
        if inputs.employees.is_empty() {
            error!(group = %inputs.group, "no active employees for group");
            return Err(PlanError::InputInsufficiency {
                group: inputs.group.clone(),
                missing: "no active employees",
            });
        }
        if inputs.shift_types.is_empty() {
            error!(group = %inputs.group, "no shift types for group");
            return Err(PlanError::InputInsufficiency {
                group: inputs.group.clone(),
                missing: "no shift types",
            });
        }

        let mask = self.weekday_mask(&mut diag);
        let operating_days =
            calendar::operating_days(inputs.month.first_day(), inputs.month.last_day(), &mask);
        diag.operating_days = operating_days.len();
        diag.stage = PlanStage::CalendarFiltered;
        info!(stage = %diag.stage, days = operating_days.len(), "calendar filtered");

        // Les absences sont semées avant le roulement : mêmes repos, même
        // mécanique, la réparation peut donc les révoquer aussi.
        let mut days_off = DayOffSet::new();
        self.seed_absences(&operating_days, &mut days_off);
        match inputs.config.as_ref().and_then(|c| c.rotation.as_ref()) {
            Some(plan) if plan.cycle_len() > 0 => {
                let report =
                    rotation::apply_rotation(&inputs.employees, &operating_days, plan, &mut days_off);
                diag.rotation_rest_days = report.rest_days_granted;
            }
            Some(_) => {
                warn!(group = %inputs.group, "rotation pattern empty, step skipped");
                diag.warnings.push(PlanWarning::RotationPatternEmpty);
            }
            None => {}
        }
        diag.stage = PlanStage::RotationApplied;
        info!(stage = %diag.stage, rest_days = diag.rotation_rest_days, "rotation applied");

        let required_per_day: usize = inputs
            .shift_types
            .iter()
            .map(|t| t.headcount as usize)
            .sum();
        let repair =
            repair::repair_days_off(&inputs.employees, &operating_days, required_per_day, &mut days_off);
        diag.repairs_performed = repair.revocations.len();
        diag.required_total = repair.required_total;
        diag.available_total = repair.available_total;
        if !repair.short_days.is_empty() {
            warn!(
                days = repair.short_days.len(),
                "headcount still short after revoking every day off"
            );
            diag.warnings.push(PlanWarning::CoverageShortfall {
                days: repair.short_days.clone(),
            });
        }
        diag.stage = PlanStage::FeasibilityChecked;
        info!(
            stage = %diag.stage,
            repairs = diag.repairs_performed,
            available = diag.available_total,
            required = diag.required_total,
            "feasibility checked"
        );

        let profile = self.resolve_profile(&mut diag);
        let mut model_builder = ScheduleModelBuilder::new(
            &inputs.employees,
            &inputs.shift_types,
            &operating_days,
            &days_off,
        )
        .with_forbidden_transitions(&self.options.forbidden_transitions);
        if let Some(profile) = profile.as_ref() {
            model_builder = model_builder.with_profile(profile);
        }
        let (model, grid) = model_builder.build();
        diag.stage = PlanStage::ModelBuilt;
        info!(
            stage = %diag.stage,
            bools = model.num_bools(),
            ints = model.num_ints(),
            rows = model.num_rows(),
            "model built"
        );

        let config = SolverConfig::with_time_limit(self.options.time_limit);
        let adapter = SolverAdapter::new(&inputs.employees, &inputs.shift_types, &operating_days);
        let report = adapter.run(solver, &model, &grid, &config)?;
        diag.stage = PlanStage::Solved;
        diag.solver_status = Some(report.status.to_string());
        diag.solve_nodes = report.stats.nodes;
        diag.solve_elapsed_ms = report.stats.elapsed.as_millis() as u64;
        diag.objective_deviation = report.objective;
        diag.distribution = Some(report.distribution);

        diag.stage = PlanStage::Validated;
        info!(
            stage = %diag.stage,
            status = %report.status,
            entries = report.assignment.len(),
            "plan accepted"
        );

        Ok(PlanOutcome {
            assignment: report.assignment,
            diagnostics: diag,
        })
    }

    /// Masque hebdomadaire du groupe. Un masque absent, vide ou illisible
    /// retient tous les jours, et le repli est consigné.
    fn weekday_mask(&self, diag: &mut Diagnostics) -> WeekdayMask {
        let Some(config) = self.inputs.config.as_ref() else {
            warn!(group = %self.inputs.group, "no operating config, keeping every weekday");
            diag.warnings.push(PlanWarning::CalendarFallback {
                unknown_names: Vec::new(),
            });
            return WeekdayMask::all();
        };
        let (mask, unknown) = WeekdayMask::from_names(config.open_days.iter());
        if mask.is_empty() {
            warn!(group = %self.inputs.group, "weekly mask empty or unreadable, keeping every weekday");
            diag.warnings.push(PlanWarning::CalendarFallback {
                unknown_names: unknown,
            });
            return WeekdayMask::all();
        }
        if !unknown.is_empty() {
            warn!(names = ?unknown, "unknown weekday names in operating config");
            diag.warnings.push(PlanWarning::UnknownOpenDays { names: unknown });
        }
        mask
    }

    /// Pose les absences déclarées comme repos, restreintes aux jours
    /// ouvrés du mois pour ne pas fausser les comptages de capacité.
    fn seed_absences(&self, operating_days: &[NaiveDate], days_off: &mut DayOffSet) {
        for absence in &self.inputs.absences {
            if !self.inputs.employees.iter().any(|e| e.id == absence.employee) {
                continue;
            }
            for day in absence.days() {
                if operating_days.binary_search(&day).is_ok() {
                    days_off.grant(absence.employee, day);
                }
            }
        }
    }

    /// Résout le profil nominal (clés par nom) vers les identifiants.
    /// Les entrées inutilisables sont écartées avec avertissement ; un
    /// profil vide après résolution désactive l'objectif.
    fn resolve_profile(&self, diag: &mut Diagnostics) -> Option<IdealProfile> {
        let raw = self.inputs.ideal_profile.as_ref()?;
        let mut profile = IdealProfile::new();
        for (name, targets) in raw {
            let Some(employee) = self.inputs.employees.iter().find(|e| &e.name == name) else {
                debug!(employee = %name, "ideal profile entry without matching active employee");
                diag.warnings.push(PlanWarning::ProfileEntryDropped { name: name.clone() });
                continue;
            };
            for (shift_name, count) in targets {
                let Some(code) = ShiftCode::from_name(shift_name) else {
                    diag.warnings.push(PlanWarning::ProfileEntryDropped { name: name.clone() });
                    continue;
                };
                profile.set(employee.id, code, *count);
            }
        }
        if profile.is_empty() {
            None
        } else {
            Some(profile)
        }
    }
}
