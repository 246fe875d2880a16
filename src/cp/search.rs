use super::model::{CpModel, LinExpr};
use super::solver::{CpOutcome, CpSolution, CpSolver, SolveStats, SolveStatus, SolverConfig};
use std::time::Instant;
use tracing::debug;

/// Solveur embarqué de référence : parcours en profondeur sur les variables
/// booléennes, propagation de bornes sur les lignes, séparation-évaluation
/// sur l'objectif. Déterministe : branchement par indice croissant, branche
/// « vrai » d'abord, aucune source d'aléa.
///
/// Toute solution rendue est revérifiée ligne à ligne avant acceptation.
/// L'exploration est exhaustive quand chaque ligne ne touche qu'une
/// variable entière une fois les booléens figés, ce qui couvre les modèles
/// émis par le constructeur de ce crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchBoundSolver;

impl BranchBoundSolver {
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for BranchBoundSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpOutcome {
        Search::new(model, config).run()
    }
}

/// Variation enregistrée sur la piste, pour restauration au retour arrière
enum Change {
    Bool(usize),
    IntLb(usize, i64),
    IntUb(usize, i64),
    RowSums(usize, i64, i64),
}

struct Decision {
    var: usize,
    trail_mark: usize,
    /// La branche `false` a-t-elle déjà été explorée.
    flipped: bool,
}

/// Bornes courantes de la partie gauche d'une ligne
struct RowState {
    min_sum: i64,
    max_sum: i64,
}

struct Search<'m> {
    model: &'m CpModel,
    deadline: Instant,
    started: Instant,
    bools: Vec<Option<bool>>,
    int_lb: Vec<i64>,
    int_ub: Vec<i64>,
    row_state: Vec<RowState>,
    bool_occ: Vec<Vec<(usize, i64)>>,
    int_occ: Vec<Vec<(usize, i64)>>,
    trail: Vec<Change>,
    queue: Vec<usize>,
    queued: Vec<bool>,
    decisions: Vec<Decision>,
    incumbent: Option<(CpSolution, i64)>,
    nodes: u64,
}

impl<'m> Search<'m> {
    fn new(model: &'m CpModel, config: &SolverConfig) -> Self {
        let nb = model.num_bools();
        let ni = model.num_ints();
        let nr = model.num_rows();
        let mut bool_occ = vec![Vec::new(); nb];
        let mut int_occ = vec![Vec::new(); ni];
        let mut row_state = Vec::with_capacity(nr);
        for (idx, row) in model.rows().iter().enumerate() {
            let mut min_sum = 0i64;
            let mut max_sum = 0i64;
            for &(v, c) in &row.bools {
                bool_occ[v].push((idx, c));
                min_sum += c.min(0);
                max_sum += c.max(0);
            }
            for &(v, c) in &row.ints {
                int_occ[v].push((idx, c));
                let (lb, ub) = model.int_bounds()[v];
                if c > 0 {
                    min_sum += c * lb;
                    max_sum += c * ub;
                } else {
                    min_sum += c * ub;
                    max_sum += c * lb;
                }
            }
            row_state.push(RowState { min_sum, max_sum });
        }
        let started = Instant::now();
        Self {
            model,
            deadline: started + config.time_limit,
            started,
            bools: vec![None; nb],
            int_lb: model.int_bounds().iter().map(|b| b.0).collect(),
            int_ub: model.int_bounds().iter().map(|b| b.1).collect(),
            row_state,
            bool_occ,
            int_occ,
            trail: Vec::new(),
            queue: (0..nr).collect(),
            queued: vec![true; nr],
            decisions: Vec::new(),
            incumbent: None,
            nodes: 0,
        }
    }

    fn run(mut self) -> CpOutcome {
        if self.model.trivially_infeasible() {
            return self.finish(SolveStatus::Infeasible, None, None);
        }
        // fixations du modèle, posées comme affectations racine
        let model = self.model;
        for (var, fixed) in model.bool_fixed().iter().enumerate() {
            if let Some(value) = *fixed {
                if !self.assign_bool(var, value) {
                    return self.finish(SolveStatus::Infeasible, None, None);
                }
            }
        }
        loop {
            if Instant::now() >= self.deadline {
                return self.timeout_outcome();
            }
            let open = self.propagate() && !self.bounded_out();
            if open {
                match self.pick_branch_var() {
                    Some(var) => {
                        self.branch(var);
                        continue;
                    }
                    None => {
                        if let Some(done) = self.handle_leaf() {
                            return done;
                        }
                        // feuille enregistrée : on remonte pour chercher mieux
                    }
                }
            }
            if !self.backtrack() {
                return self.exhausted_outcome();
            }
        }
    }

    /// Propage la file jusqu'au point fixe ; `false` en cas de conflit.
    fn propagate(&mut self) -> bool {
        while let Some(row) = self.queue.pop() {
            self.queued[row] = false;
            let rhs = self.model.rows()[row].rhs;
            if self.row_state[row].min_sum > rhs {
                return false;
            }
            if self.row_state[row].max_sum <= rhs {
                continue;
            }
            if !self.tighten_row(row) {
                return false;
            }
        }
        true
    }

    fn tighten_row(&mut self, row: usize) -> bool {
        // booléens : si la valeur « haute » fait dépasser le rhs, la basse
        // s'impose (coef positif → false, négatif → true)
        let nb = self.model.rows()[row].bools.len();
        for k in 0..nb {
            let (var, coef) = self.model.rows()[row].bools[k];
            if self.bools[var].is_some() {
                continue;
            }
            let slack = self.model.rows()[row].rhs - self.row_state[row].min_sum;
            if coef.abs() > slack {
                let forced = coef < 0;
                if !self.assign_bool(var, forced) {
                    return false;
                }
            }
        }
        let ni = self.model.rows()[row].ints.len();
        for k in 0..ni {
            let (var, coef) = self.model.rows()[row].ints[k];
            let (lb, ub) = (self.int_lb[var], self.int_ub[var]);
            if lb == ub {
                continue;
            }
            let own_min = if coef > 0 { coef * lb } else { coef * ub };
            let bound = self.model.rows()[row].rhs - (self.row_state[row].min_sum - own_min);
            // div_euclid arrondit vers le bas pour un diviseur positif et
            // vers le haut pour un négatif : exact dans les deux sens
            if coef > 0 {
                let new_ub = bound.div_euclid(coef);
                if new_ub < lb {
                    return false;
                }
                if new_ub < ub {
                    self.set_int_ub(var, new_ub);
                }
            } else {
                let new_lb = bound.div_euclid(coef);
                if new_lb > ub {
                    return false;
                }
                if new_lb > lb {
                    self.set_int_lb(var, new_lb);
                }
            }
        }
        true
    }

    /// Affecte un booléen et met à jour les bornes des lignes concernées.
    /// `false` si la variable est déjà figée à l'autre valeur.
    fn assign_bool(&mut self, var: usize, value: bool) -> bool {
        match self.bools[var] {
            Some(prev) => prev == value,
            None => {
                self.bools[var] = Some(value);
                self.trail.push(Change::Bool(var));
                for k in 0..self.bool_occ[var].len() {
                    let (row, coef) = self.bool_occ[var][k];
                    let state = &self.row_state[row];
                    self.trail
                        .push(Change::RowSums(row, state.min_sum, state.max_sum));
                    let contrib = if value { coef } else { 0 };
                    let state = &mut self.row_state[row];
                    state.min_sum += contrib - coef.min(0);
                    state.max_sum += contrib - coef.max(0);
                    self.enqueue(row);
                }
                true
            }
        }
    }

    fn set_int_lb(&mut self, var: usize, new_lb: i64) {
        let old = self.int_lb[var];
        self.trail.push(Change::IntLb(var, old));
        self.int_lb[var] = new_lb;
        for k in 0..self.int_occ[var].len() {
            let (row, coef) = self.int_occ[var][k];
            let state = &self.row_state[row];
            self.trail
                .push(Change::RowSums(row, state.min_sum, state.max_sum));
            let delta = coef * (new_lb - old);
            if coef > 0 {
                self.row_state[row].min_sum += delta;
            } else {
                self.row_state[row].max_sum += delta;
            }
            self.enqueue(row);
        }
    }

    fn set_int_ub(&mut self, var: usize, new_ub: i64) {
        let old = self.int_ub[var];
        self.trail.push(Change::IntUb(var, old));
        self.int_ub[var] = new_ub;
        for k in 0..self.int_occ[var].len() {
            let (row, coef) = self.int_occ[var][k];
            let state = &self.row_state[row];
            self.trail
                .push(Change::RowSums(row, state.min_sum, state.max_sum));
            let delta = coef * (new_ub - old);
            if coef > 0 {
                self.row_state[row].max_sum += delta;
            } else {
                self.row_state[row].min_sum += delta;
            }
            self.enqueue(row);
        }
    }

    fn enqueue(&mut self, row: usize) {
        if !self.queued[row] {
            self.queued[row] = true;
            self.queue.push(row);
        }
    }

    fn pick_branch_var(&self) -> Option<usize> {
        self.bools.iter().position(Option::is_none)
    }

    fn branch(&mut self, var: usize) {
        self.nodes += 1;
        self.decisions.push(Decision {
            var,
            trail_mark: self.trail.len(),
            flipped: false,
        });
        let ok = self.assign_bool(var, true);
        debug_assert!(ok, "branch variable must be unfixed");
    }

    /// Remonte jusqu'à une décision dont la branche `false` reste à prendre.
    /// `false` quand l'arbre est épuisé.
    fn backtrack(&mut self) -> bool {
        while let Some(mut decision) = self.decisions.pop() {
            self.undo_to(decision.trail_mark);
            if !decision.flipped {
                decision.flipped = true;
                decision.trail_mark = self.trail.len();
                let var = decision.var;
                self.decisions.push(decision);
                self.nodes += 1;
                let ok = self.assign_bool(var, false);
                debug_assert!(ok, "flipped variable must be unfixed");
                return true;
            }
        }
        false
    }

    fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            match self.trail.pop() {
                Some(Change::Bool(v)) => self.bools[v] = None,
                Some(Change::IntLb(v, old)) => self.int_lb[v] = old,
                Some(Change::IntUb(v, old)) => self.int_ub[v] = old,
                Some(Change::RowSums(r, min, max)) => {
                    self.row_state[r].min_sum = min;
                    self.row_state[r].max_sum = max;
                }
                None => break,
            }
        }
        // l'état restauré était un point fixe : la file repart à vide
        self.queue.clear();
        for flag in &mut self.queued {
            *flag = false;
        }
    }

    /// Élagage : la borne basse de l'objectif atteint déjà le titulaire.
    fn bounded_out(&self) -> bool {
        let (Some((_, best)), Some(expr)) = (self.incumbent.as_ref(), self.model.objective_expr())
        else {
            return false;
        };
        let mut lower = 0i64;
        for &(v, c) in &expr.bools {
            lower += match self.bools[v.index()] {
                Some(true) => c,
                Some(false) => 0,
                None => c.min(0),
            };
        }
        for &(v, c) in &expr.ints {
            let i = v.index();
            lower += if c >= 0 {
                c * self.int_lb[i]
            } else {
                c * self.int_ub[i]
            };
        }
        lower >= *best
    }

    /// Tous les booléens sont figés : extrait un candidat, le revérifie,
    /// puis le rend (satisfaction) ou le retient comme titulaire (objectif).
    fn handle_leaf(&mut self) -> Option<CpOutcome> {
        let bools: Vec<bool> = self.bools.iter().map(|b| b.unwrap_or(false)).collect();
        // minimisation : chaque entier prend sa borne basse propagée
        let ints: Vec<i64> = self.int_lb.clone();
        if !self.verify(&bools, &ints) {
            return None;
        }
        let solution = CpSolution::new(bools, ints);
        let model = self.model;
        match model.objective_expr() {
            None => Some(self.finish(SolveStatus::Feasible, Some(solution), None)),
            Some(expr) => {
                let value = eval_expr(expr, &solution);
                let better = self.incumbent.as_ref().map_or(true, |(_, best)| value < *best);
                if better {
                    debug!(objective = value, nodes = self.nodes, "incumbent improved");
                    self.incumbent = Some((solution, value));
                }
                None
            }
        }
    }

    fn verify(&self, bools: &[bool], ints: &[i64]) -> bool {
        self.model.rows().iter().all(|row| {
            let mut total = 0i64;
            for &(v, c) in &row.bools {
                if bools[v] {
                    total += c;
                }
            }
            for &(v, c) in &row.ints {
                total += c * ints[v];
            }
            total <= row.rhs
        })
    }

    fn timeout_outcome(&mut self) -> CpOutcome {
        match self.incumbent.take() {
            Some((solution, objective)) => {
                self.finish(SolveStatus::Feasible, Some(solution), Some(objective))
            }
            None => self.finish(SolveStatus::Unknown, None, None),
        }
    }

    fn exhausted_outcome(&mut self) -> CpOutcome {
        match self.incumbent.take() {
            Some((solution, objective)) => {
                self.finish(SolveStatus::Optimal, Some(solution), Some(objective))
            }
            None => self.finish(SolveStatus::Infeasible, None, None),
        }
    }

    fn finish(
        &mut self,
        status: SolveStatus,
        solution: Option<CpSolution>,
        objective: Option<i64>,
    ) -> CpOutcome {
        let stats = SolveStats {
            nodes: self.nodes,
            elapsed: self.started.elapsed(),
        };
        debug!(%status, nodes = stats.nodes, "search finished");
        CpOutcome {
            status,
            solution,
            objective,
            stats,
        }
    }
}

fn eval_expr(expr: &LinExpr, solution: &CpSolution) -> i64 {
    let mut total = 0i64;
    for &(v, c) in &expr.bools {
        if solution.bool_value(v) {
            total += c;
        }
    }
    for &(v, c) in &expr.ints {
        total += c * solution.int_value(v);
    }
    total
}
