use crate::cp::SolveStatus;
use crate::model::ShiftCode;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Options du planificateur mensuel
#[derive(Debug, Clone)]
pub struct PlannerOptions {
    /// Paires (code précédent, code suivant) interdites sur deux jours
    /// ouvrés consécutifs. Les paires sans code chargé sont ignorées.
    pub forbidden_transitions: Vec<(ShiftCode, ShiftCode)>,
    /// Budget mur d'horloge accordé au solveur.
    pub time_limit: Duration,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            forbidden_transitions: Self::default_transitions(),
            time_limit: Duration::from_secs(60),
        }
    }
}

impl PlannerOptions {
    /// Enchaînements refusés par défaut : nuit→matin, matin→tarde,
    /// intermédiaire→tarde, intermédiaire→nuit, tarde→nuit.
    pub fn default_transitions() -> Vec<(ShiftCode, ShiftCode)> {
        [('N', 'M'), ('M', 'T'), ('I', 'T'), ('I', 'N'), ('T', 'N')]
            .into_iter()
            .map(|(prev, next)| (ShiftCode::new(prev), ShiftCode::new(next)))
            .collect()
    }
}

/// Étape de l'orchestration (machine à états strictement séquentielle)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStage {
    Loading,
    CalendarFiltered,
    RotationApplied,
    FeasibilityChecked,
    ModelBuilt,
    Solved,
    Validated,
    Failed,
}

impl fmt::Display for PlanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlanStage::Loading => "loading",
            PlanStage::CalendarFiltered => "calendar_filtered",
            PlanStage::RotationApplied => "rotation_applied",
            PlanStage::FeasibilityChecked => "feasibility_checked",
            PlanStage::ModelBuilt => "model_built",
            PlanStage::Solved => "solved",
            PlanStage::Validated => "validated",
            PlanStage::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Défaut de configuration récupérable, consigné puis contourné
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanWarning {
    /// Masque hebdomadaire vide ou illisible : tous les jours retenus.
    CalendarFallback { unknown_names: Vec<String> },
    /// Noms de jours non reconnus ; le reste du masque est appliqué.
    UnknownOpenDays { names: Vec<String> },
    /// Motif de roulement vide ou cycle nul : étape ignorée.
    RotationPatternEmpty,
    /// Entrée du profil idéal inutilisable (employé inconnu du groupe,
    /// ou clé de poste vide) : écartée.
    ProfileEntryDropped { name: String },
    /// Même tous repos révoqués, ces jours restent sous l'exigence.
    CoverageShortfall { days: Vec<NaiveDate> },
}

/// Statistiques de distribution des postes par employé (zéros inclus)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DistributionStats {
    pub mean: f64,
    pub min: usize,
    pub max: usize,
}

/// Diagnostic machine d'une exécution, rendu avec l'affectation.
/// Remplace toute narration console : les consommateurs (CLI, tests,
/// couche web) l'exploitent programmatiquement.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub run_id: String,
    pub stage: PlanStage,
    pub operating_days: usize,
    pub employees: usize,
    pub shift_types: usize,
    pub rotation_rest_days: usize,
    pub repairs_performed: usize,
    pub required_total: usize,
    pub available_total: usize,
    pub solver_status: Option<String>,
    pub solve_nodes: u64,
    pub solve_elapsed_ms: u64,
    pub objective_deviation: Option<i64>,
    pub distribution: Option<DistributionStats>,
    pub warnings: Vec<PlanWarning>,
}

impl Diagnostics {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            stage: PlanStage::Loading,
            operating_days: 0,
            employees: 0,
            shift_types: 0,
            rotation_rest_days: 0,
            repairs_performed: 0,
            required_total: 0,
            available_total: 0,
            solver_status: None,
            solve_nodes: 0,
            solve_elapsed_ms: 0,
            objective_deviation: None,
            distribution: None,
            warnings: Vec::new(),
        }
    }
}

/// Échecs fatals d'une exécution : la planification est tout ou rien,
/// aucune affectation partielle n'est jamais rendue.
#[derive(Error, Debug)]
pub enum PlanError {
    /// Pas d'employé actif, ou pas de type de poste, pour le groupe visé.
    #[error("insufficient inputs for group {group}: {missing}")]
    InputInsufficiency { group: String, missing: &'static str },
    /// Le solveur prouve l'infaisabilité, ou épuise son budget sans candidat.
    #[error("no feasible assignment (solver status: {status})")]
    InfeasibleModel { status: SolveStatus },
    /// Le solveur annonce un succès mais la revalidation trouve des créneaux
    /// sous l'effectif : rupture de contrat interne, jamais un « réessayez ».
    #[error("coverage violation: {shortfalls} slot(s) under required headcount")]
    CoverageViolation { shortfalls: usize },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
