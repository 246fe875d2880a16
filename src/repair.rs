use crate::model::{DayOffSet, Employee, EmployeeId};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

/// Révocation d'un repos décidée par la réparation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revocation {
    pub employee: EmployeeId,
    pub day: NaiveDate,
}

/// Bilan de la réparation de faisabilité
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Repos retirés, dans l'ordre de traitement des jours.
    pub revocations: Vec<Revocation>,
    /// Exigence cumulée sur l'horizon (jours × effectifs requis).
    pub required_total: usize,
    /// Disponibilités cumulées après réparation.
    pub available_total: usize,
    /// Jours restés déficitaires : l'effectif du groupe entier est
    /// inférieur à l'exigence, même tous repos révoqués.
    pub short_days: Vec<NaiveDate>,
}

/// Garantit qu'aucun jour ouvré ne reste incouvrable après le roulement.
///
/// Réparation gloutonne, jour par jour, sans retour arrière : tant que les
/// disponibles sont insuffisants, retire des repos en commençant par les
/// employés qui en cumulent le plus (à égalité, id croissant). Ne supprime
/// jamais plus que le déficit du jour et n'ajoute jamais de repos. Les
/// comptes par employé sont entretenus au fil des révocations, de sorte que
/// les jours suivants voient les totaux déjà réduits.
pub fn repair_days_off(
    employees: &[Employee],
    operating_days: &[NaiveDate],
    required_per_day: usize,
    days_off: &mut DayOffSet,
) -> RepairReport {
    let mut totals: BTreeMap<EmployeeId, usize> = employees
        .iter()
        .map(|e| (e.id, days_off.count_for(e.id)))
        .collect();

    let mut report = RepairReport::default();
    for &day in operating_days {
        let available = employees
            .iter()
            .filter(|e| !days_off.is_off(e.id, day))
            .count();
        if available >= required_per_day {
            continue;
        }
        let deficit = required_per_day - available;

        let mut resting: Vec<(EmployeeId, usize)> = employees
            .iter()
            .filter(|e| days_off.is_off(e.id, day))
            .map(|e| (e.id, totals.get(&e.id).copied().unwrap_or(0)))
            .collect();
        resting.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        for (employee, _) in resting.into_iter().take(deficit) {
            if days_off.revoke(employee, day) {
                if let Some(total) = totals.get_mut(&employee) {
                    *total = total.saturating_sub(1);
                }
                report.revocations.push(Revocation { employee, day });
                debug!(employee = %employee, day = %day, "day off revoked");
            }
        }

        let post = employees
            .iter()
            .filter(|e| !days_off.is_off(e.id, day))
            .count();
        if post < required_per_day {
            report.short_days.push(day);
        }
    }

    report.required_total = required_per_day * operating_days.len();
    report.available_total = employees
        .iter()
        .map(|e| operating_days.len().saturating_sub(days_off.count_for(e.id)))
        .sum();
    report
}
