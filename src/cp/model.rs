/// Variable booléenne de décision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoolVar(usize);

impl BoolVar {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Variable entière auxiliaire, à domaine borné
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntVar(usize);

impl IntVar {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Expression linéaire sur variables booléennes et entières
#[derive(Debug, Clone, Default)]
pub struct LinExpr {
    pub(crate) bools: Vec<(BoolVar, i64)>,
    pub(crate) ints: Vec<(IntVar, i64)>,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Somme de booléens à coefficient 1.
    pub fn sum_bools<I: IntoIterator<Item = BoolVar>>(vars: I) -> Self {
        let mut expr = Self::new();
        for var in vars {
            expr.add_bool(var, 1);
        }
        expr
    }

    pub fn add_bool(&mut self, var: BoolVar, coef: i64) {
        if coef != 0 {
            self.bools.push((var, coef));
        }
    }

    pub fn add_int(&mut self, var: IntVar, coef: i64) {
        if coef != 0 {
            self.ints.push((var, coef));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bools.is_empty() && self.ints.is_empty()
    }

    fn negated(&self) -> Self {
        Self {
            bools: self.bools.iter().map(|&(v, c)| (v, -c)).collect(),
            ints: self.ints.iter().map(|&(v, c)| (v, -c)).collect(),
        }
    }
}

/// Contrainte normalisée : `Σ coef·var ≤ rhs`
#[derive(Debug, Clone)]
pub(crate) struct Row {
    pub(crate) bools: Vec<(usize, i64)>,
    pub(crate) ints: Vec<(usize, i64)>,
    pub(crate) rhs: i64,
}

/// Modèle de contraintes linéaires en variables booléennes et entières
/// bornées, avec objectif de minimisation optionnel. Toutes les contraintes
/// sont normalisées en `≤` à l'insertion ; une égalité produit deux lignes.
#[derive(Debug, Clone, Default)]
pub struct CpModel {
    bool_fixed: Vec<Option<bool>>,
    int_bounds: Vec<(i64, i64)>,
    rows: Vec<Row>,
    objective: Option<LinExpr>,
    infeasible: bool,
}

impl CpModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_bool(&mut self) -> BoolVar {
        self.bool_fixed.push(None);
        BoolVar(self.bool_fixed.len() - 1)
    }

    pub fn new_int(&mut self, lb: i64, ub: i64) -> IntVar {
        if lb > ub {
            self.infeasible = true;
        }
        self.int_bounds.push((lb, ub));
        IntVar(self.int_bounds.len() - 1)
    }

    /// Fige une variable booléenne ; deux fixations contradictoires rendent
    /// le modèle trivialement infaisable.
    pub fn fix_bool(&mut self, var: BoolVar, value: bool) {
        match self.bool_fixed[var.0] {
            Some(prev) if prev != value => self.infeasible = true,
            _ => self.bool_fixed[var.0] = Some(value),
        }
    }

    /// Ajoute `expr ≤ rhs`.
    pub fn add_le(&mut self, expr: LinExpr, rhs: i64) {
        self.push_row(&expr, rhs);
    }

    /// Ajoute `expr ≥ rhs`.
    pub fn add_ge(&mut self, expr: LinExpr, rhs: i64) {
        self.push_row(&expr.negated(), -rhs);
    }

    /// Ajoute `expr = rhs`.
    pub fn add_eq(&mut self, expr: LinExpr, rhs: i64) {
        self.push_row(&expr, rhs);
        self.push_row(&expr.negated(), -rhs);
    }

    /// Déclare l'objectif : minimiser `objective`.
    pub fn minimize(&mut self, objective: LinExpr) {
        self.objective = Some(objective);
    }

    pub fn has_objective(&self) -> bool {
        self.objective.is_some()
    }

    pub fn num_bools(&self) -> usize {
        self.bool_fixed.len()
    }

    pub fn num_ints(&self) -> usize {
        self.int_bounds.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn push_row(&mut self, expr: &LinExpr, rhs: i64) {
        self.rows.push(Row {
            bools: expr.bools.iter().map(|&(v, c)| (v.0, c)).collect(),
            ints: expr.ints.iter().map(|&(v, c)| (v.0, c)).collect(),
            rhs,
        });
    }

    pub(crate) fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub(crate) fn bool_fixed(&self) -> &[Option<bool>] {
        &self.bool_fixed
    }

    pub(crate) fn int_bounds(&self) -> &[(i64, i64)] {
        &self.int_bounds
    }

    pub(crate) fn objective_expr(&self) -> Option<&LinExpr> {
        self.objective.as_ref()
    }

    pub(crate) fn trivially_infeasible(&self) -> bool {
        self.infeasible
    }
}
