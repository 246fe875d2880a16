use crate::cp::{BoolVar, CpModel, LinExpr};
use crate::model::{DayOffSet, Employee, IdealProfile, ShiftCode, ShiftType};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Grille d'indexation des variables : une booléenne par triplet
/// (employé, jour ouvré, type de poste), aplatie employé-majeur.
#[derive(Debug, Clone)]
pub struct VarGrid {
    vars: Vec<BoolVar>,
    days: usize,
    shifts: usize,
}

impl VarGrid {
    fn new(model: &mut CpModel, employees: usize, days: usize, shifts: usize) -> Self {
        let count = employees * days * shifts;
        let mut vars = Vec::with_capacity(count);
        for _ in 0..count {
            vars.push(model.new_bool());
        }
        Self { vars, days, shifts }
    }

    /// Variable « l'employé `employee` tient le poste `shift` le jour `day` ».
    pub fn var(&self, employee: usize, day: usize, shift: usize) -> BoolVar {
        self.vars[(employee * self.days + day) * self.shifts + shift]
    }
}

/// Traduit un mois préparé (jours ouvrés filtrés, repos posés) en modèle
/// de contraintes. La construction est purement déclarative : aucune
/// résolution ici.
pub struct ScheduleModelBuilder<'a> {
    employees: &'a [Employee],
    shift_types: &'a [ShiftType],
    operating_days: &'a [NaiveDate],
    days_off: &'a DayOffSet,
    profile: Option<&'a IdealProfile>,
    forbidden: &'a [(ShiftCode, ShiftCode)],
}

impl<'a> ScheduleModelBuilder<'a> {
    pub fn new(
        employees: &'a [Employee],
        shift_types: &'a [ShiftType],
        operating_days: &'a [NaiveDate],
        days_off: &'a DayOffSet,
    ) -> Self {
        Self {
            employees,
            shift_types,
            operating_days,
            days_off,
            profile: None,
            forbidden: &[],
        }
    }

    /// Active l'objectif d'écart au profil idéal (ignoré si le profil est vide).
    pub fn with_profile(mut self, profile: &'a IdealProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_forbidden_transitions(mut self, pairs: &'a [(ShiftCode, ShiftCode)]) -> Self {
        self.forbidden = pairs;
        self
    }

    /// Construit le modèle complet et la grille permettant de relire
    /// la solution. L'ordre des contraintes n'a aucun effet sémantique.
    pub fn build(&self) -> (CpModel, VarGrid) {
        let n_emp = self.employees.len();
        let n_days = self.operating_days.len();
        let n_shifts = self.shift_types.len();

        let mut model = CpModel::new();
        let grid = VarGrid::new(&mut model, n_emp, n_days, n_shifts);

        self.at_most_one_shift_per_day(&mut model, &grid);
        self.exact_coverage(&mut model, &grid);
        self.forbidden_adjacency(&mut model, &grid);
        self.fix_days_off(&mut model, &grid);
        self.balance_band(&mut model, &grid);
        self.rest_window(&mut model, &grid);
        self.deviation_objective(&mut model, &grid);

        (model, grid)
    }

    /// Un employé tient au plus un poste par jour.
    fn at_most_one_shift_per_day(&self, model: &mut CpModel, grid: &VarGrid) {
        for e in 0..self.employees.len() {
            for d in 0..self.operating_days.len() {
                let expr =
                    LinExpr::sum_bools((0..self.shift_types.len()).map(|s| grid.var(e, d, s)));
                model.add_le(expr, 1);
            }
        }
    }

    /// Chaque poste reçoit exactement son effectif, chaque jour ouvré.
    fn exact_coverage(&self, model: &mut CpModel, grid: &VarGrid) {
        for d in 0..self.operating_days.len() {
            for (s, shift) in self.shift_types.iter().enumerate() {
                let expr =
                    LinExpr::sum_bools((0..self.employees.len()).map(|e| grid.var(e, d, s)));
                model.add_eq(expr, i64::from(shift.headcount));
            }
        }
    }

    /// Enchaînements interdits entre jours ouvrés consécutifs (indices
    /// d et d+1 de la liste filtrée, pas du calendrier civil). Les paires
    /// citant un code absent du groupe sont ignorées.
    fn forbidden_adjacency(&self, model: &mut CpModel, grid: &VarGrid) {
        let mut code_index: BTreeMap<ShiftCode, usize> = BTreeMap::new();
        for (s, shift) in self.shift_types.iter().enumerate() {
            code_index.insert(shift.code, s);
        }
        for e in 0..self.employees.len() {
            for d in 1..self.operating_days.len() {
                for (prev, next) in self.forbidden {
                    let (Some(&sp), Some(&sn)) = (code_index.get(prev), code_index.get(next))
                    else {
                        continue;
                    };
                    let mut expr = LinExpr::new();
                    expr.add_bool(grid.var(e, d - 1, sp), 1);
                    expr.add_bool(grid.var(e, d, sn), 1);
                    model.add_le(expr, 1);
                }
            }
        }
    }

    /// Repos imposés : variables figées à faux, pas de pénalité molle.
    fn fix_days_off(&self, model: &mut CpModel, grid: &VarGrid) {
        for (e, employee) in self.employees.iter().enumerate() {
            for (d, day) in self.operating_days.iter().enumerate() {
                if self.days_off.is_off(employee.id, *day) {
                    for s in 0..self.shift_types.len() {
                        model.fix_bool(grid.var(e, d, s), false);
                    }
                }
            }
        }
    }

    /// Bande d'équilibre dure : le total mensuel de chaque employé tombe
    /// dans [total/n, total/n + 1].
    fn balance_band(&self, model: &mut CpModel, grid: &VarGrid) {
        let n_emp = self.employees.len();
        if n_emp == 0 {
            return;
        }
        let per_day: i64 = self
            .shift_types
            .iter()
            .map(|t| i64::from(t.headcount))
            .sum();
        let total_slots = per_day * self.operating_days.len() as i64;
        let floor = total_slots / n_emp as i64;
        let ceiling = floor + 1;
        for e in 0..n_emp {
            let mut expr = LinExpr::new();
            for d in 0..self.operating_days.len() {
                for s in 0..self.shift_types.len() {
                    expr.add_bool(grid.var(e, d, s), 1);
                }
            }
            model.add_ge(expr.clone(), floor);
            model.add_le(expr, ceiling);
        }
    }

    /// Au plus 6 jours travaillés sur toute fenêtre de 7 jours ouvrés
    /// consécutifs. Aucune fenêtre quand le mois filtré en compte moins de 7.
    fn rest_window(&self, model: &mut CpModel, grid: &VarGrid) {
        let n_days = self.operating_days.len();
        for e in 0..self.employees.len() {
            for start in 0..n_days.saturating_sub(6) {
                let mut expr = LinExpr::new();
                for d in start..start + 7 {
                    for s in 0..self.shift_types.len() {
                        expr.add_bool(grid.var(e, d, s), 1);
                    }
                }
                model.add_le(expr, 6);
            }
        }
    }

    /// Objectif : minimiser la somme des écarts absolus entre postes tenus
    /// et cibles du profil. Un écart est modélisé par un entier majorant
    /// |réel − idéal| via ses deux faces ; chaque paire (employé, poste)
    /// en reçoit un, cible 0 pour les absents du profil.
    fn deviation_objective(&self, model: &mut CpModel, grid: &VarGrid) {
        let Some(profile) = self.profile else {
            return;
        };
        if profile.is_empty() {
            return;
        }
        let n_days = self.operating_days.len();
        let mut objective = LinExpr::new();
        for (e, employee) in self.employees.iter().enumerate() {
            for (s, shift) in self.shift_types.iter().enumerate() {
                let ideal = i64::from(profile.target(employee.id, shift.code));
                let dev = model.new_int(0, 1000);
                // dev ≥ réel − idéal
                let mut over = LinExpr::new();
                over.add_int(dev, 1);
                for d in 0..n_days {
                    over.add_bool(grid.var(e, d, s), -1);
                }
                model.add_ge(over, -ideal);
                // dev ≥ idéal − réel
                let mut under = LinExpr::new();
                under.add_int(dev, 1);
                for d in 0..n_days {
                    under.add_bool(grid.var(e, d, s), 1);
                }
                model.add_ge(under, ideal);
                objective.add_int(dev, 1);
            }
        }
        model.minimize(objective);
    }
}
