use super::model::{BoolVar, CpModel, IntVar};
use std::fmt;
use std::time::Duration;

/// Paramètres de résolution (budget mur d'horloge)
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    pub time_limit: Duration,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(60),
        }
    }
}

impl SolverConfig {
    pub fn with_time_limit(time_limit: Duration) -> Self {
        Self { time_limit }
    }
}

/// Statut rendu par une résolution. L'expiration du budget est une issue
/// normale, jamais une erreur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Optimum prouvé (ou exploration exhaustive sans objectif).
    Optimal,
    /// Solution admissible trouvée, optimalité non prouvée.
    Feasible,
    /// Aucune affectation ne satisfait les contraintes.
    Infeasible,
    /// Budget épuisé sans aucun candidat.
    Unknown,
}

impl SolveStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Mesures de la recherche
#[derive(Debug, Clone, Copy, Default)]
pub struct SolveStats {
    pub nodes: u64,
    pub elapsed: Duration,
}

/// Valeurs des variables d'une solution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpSolution {
    bools: Vec<bool>,
    ints: Vec<i64>,
}

impl CpSolution {
    pub(crate) fn new(bools: Vec<bool>, ints: Vec<i64>) -> Self {
        Self { bools, ints }
    }

    pub fn bool_value(&self, var: BoolVar) -> bool {
        self.bools[var.index()]
    }

    pub fn int_value(&self, var: IntVar) -> i64 {
        self.ints[var.index()]
    }
}

/// Issue complète d'une résolution
#[derive(Debug, Clone)]
pub struct CpOutcome {
    pub status: SolveStatus,
    /// Meilleure solution rencontrée, si une existe.
    pub solution: Option<CpSolution>,
    /// Valeur de l'objectif de la solution, si un objectif était posé.
    pub objective: Option<i64>,
    pub stats: SolveStats,
}

/// Capacité abstraite de résolution : variables booléennes et entières,
/// contraintes linéaires, objectif optionnel, budget temps. Le cœur du
/// planificateur ne dépend que de ce trait et peut être reciblé sur
/// n'importe quelle implémentation conforme.
pub trait CpSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpOutcome;
}
