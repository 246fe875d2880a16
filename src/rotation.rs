use crate::model::{DayOffSet, Employee, RotationPlan, SegmentKind, WorkRestSegment};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Bilan d'application du roulement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationReport {
    /// Nombre total de repos accordés.
    pub rest_days_granted: usize,
    /// Nombre d'employés ayant reçu au moins un repos.
    pub employees_affected: usize,
}

/// Projette le motif cyclique travail/repos sur les jours ouvrés et verse
/// les jours de repos obtenus dans `days_off`. Déterministe : aucune source
/// d'aléa, deux appels identiques produisent le même ensemble.
///
/// Le déphasage d'un employé est sa position dans la liste chargée, modulo
/// l'effectif, afin d'étaler les débuts de cycle sur le personnel. Motif
/// vide ou cycle nul : aucune action (défaut de configuration, pas une
/// panne).
pub fn apply_rotation(
    employees: &[Employee],
    operating_days: &[NaiveDate],
    plan: &RotationPlan,
    days_off: &mut DayOffSet,
) -> RotationReport {
    let cycle_len = i64::from(plan.cycle_len());
    if cycle_len == 0 || employees.is_empty() {
        warn!(
            cycle_len,
            employees = employees.len(),
            "rotation skipped: empty pattern or no staff"
        );
        return RotationReport::default();
    }

    let mut report = RotationReport::default();
    for (index, employee) in employees.iter().enumerate() {
        let offset = (index % employees.len()) as i64;
        let mut granted = 0usize;
        for day in operating_days {
            let since_start = day.signed_duration_since(plan.start).num_days();
            let position = (since_start + offset).rem_euclid(cycle_len);
            if falls_on_rest(&plan.pattern, position) {
                days_off.grant(employee.id, *day);
                granted += 1;
            }
        }
        if granted > 0 {
            report.rest_days_granted += granted;
            report.employees_affected += 1;
        }
        debug!(
            employee = %employee.name,
            offset,
            rest_days = granted,
            "rotation applied"
        );
    }
    report
}

/// Parcourt les segments en accumulant leurs longueurs jusqu'à contenir
/// `position` ; le segment trouvé décide travail ou repos.
fn falls_on_rest(pattern: &[WorkRestSegment], position: i64) -> bool {
    let mut acc = 0i64;
    for segment in pattern {
        let len = i64::from(segment.days);
        if position < acc + len {
            return segment.kind == SegmentKind::Rest;
        }
        acc += len;
    }
    false
}
