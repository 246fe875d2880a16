mod model;
mod search;
mod solver;

pub use model::{BoolVar, CpModel, IntVar, LinExpr};
pub use search::BranchBoundSolver;
pub use solver::{CpOutcome, CpSolution, CpSolver, SolveStats, SolveStatus, SolverConfig};
