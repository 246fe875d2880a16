use crate::cp::{CpModel, CpSolver, SolveStats, SolveStatus, SolverConfig};
use crate::model::{Assignment, AssignmentEntry, Employee, ShiftType};
use crate::planner::builder::VarGrid;
use crate::planner::types::{DistributionStats, PlanError};
use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::warn;

/// Compte rendu d'une résolution acceptée
#[derive(Debug, Clone)]
pub struct SolveReport {
    pub assignment: Assignment,
    pub status: SolveStatus,
    pub stats: SolveStats,
    pub objective: Option<i64>,
    pub distribution: DistributionStats,
}

/// Pilote le solveur puis revalide sa sortie : un statut de succès ne
/// suffit pas, chaque créneau est recompté avant décodage.
pub struct SolverAdapter<'a> {
    employees: &'a [Employee],
    shift_types: &'a [ShiftType],
    operating_days: &'a [NaiveDate],
}

impl<'a> SolverAdapter<'a> {
    pub fn new(
        employees: &'a [Employee],
        shift_types: &'a [ShiftType],
        operating_days: &'a [NaiveDate],
    ) -> Self {
        Self {
            employees,
            shift_types,
            operating_days,
        }
    }

    /// Résout, revalide la couverture, décode en affectations ordonnées
    /// jour puis poste puis employé. Optimal et Feasible sont tous deux
    /// acceptés ; tout le reste est un échec définitif.
    pub fn run<S: CpSolver>(
        &self,
        solver: &S,
        model: &CpModel,
        grid: &VarGrid,
        config: &SolverConfig,
    ) -> Result<SolveReport, PlanError> {
        let outcome = solver.solve(model, config);
        if !outcome.status.is_success() {
            return Err(PlanError::InfeasibleModel {
                status: outcome.status,
            });
        }
        let solution = outcome
            .solution
            .ok_or_else(|| anyhow!("solver reported {} without a solution", outcome.status))?;

        let mut shortfalls = 0usize;
        for (d, day) in self.operating_days.iter().enumerate() {
            for (s, shift) in self.shift_types.iter().enumerate() {
                let assigned = (0..self.employees.len())
                    .filter(|&e| solution.bool_value(grid.var(e, d, s)))
                    .count();
                let required = shift.headcount as usize;
                if assigned < required {
                    warn!(
                        day = %day,
                        shift = %shift.name,
                        assigned,
                        required,
                        "accepted solution leaves a slot under headcount"
                    );
                    shortfalls += required - assigned;
                }
            }
        }
        if shortfalls > 0 {
            return Err(PlanError::CoverageViolation { shortfalls });
        }

        let mut entries = Vec::new();
        for (d, day) in self.operating_days.iter().enumerate() {
            for (s, shift) in self.shift_types.iter().enumerate() {
                for (e, employee) in self.employees.iter().enumerate() {
                    if solution.bool_value(grid.var(e, d, s)) {
                        entries.push(AssignmentEntry {
                            employee: employee.id,
                            shift_type: shift.id,
                            date: *day,
                        });
                    }
                }
            }
        }
        let assignment = Assignment { entries };
        let distribution = self.distribution(&assignment);

        Ok(SolveReport {
            assignment,
            status: outcome.status,
            stats: outcome.stats,
            objective: outcome.objective,
            distribution,
        })
    }

    /// Moyenne, minimum et maximum des postes tenus, calculés sur tous
    /// les employés du groupe, y compris ceux restés à zéro.
    fn distribution(&self, assignment: &Assignment) -> DistributionStats {
        if self.employees.is_empty() {
            return DistributionStats::default();
        }
        let counts: Vec<usize> = self
            .employees
            .iter()
            .map(|e| assignment.total_for(e.id))
            .collect();
        let total: usize = counts.iter().sum();
        DistributionStats {
            mean: total as f64 / counts.len() as f64,
            min: counts.iter().copied().min().unwrap_or(0),
            max: counts.iter().copied().max().unwrap_or(0),
        }
    }
}
