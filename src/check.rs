//! Revalidation d'un planning persisté contre le référentiel courant.
//! Le référentiel ayant pu bouger depuis la génération (employé
//! désactivé, effectif modifié), un planning accepté hier peut être en
//! défaut aujourd'hui ; chaque écart devient un constat typé.

use crate::calendar::{self, WeekdayMask};
use crate::model::{EmployeeId, Month, MonthlySchedule, ShiftCode, ShiftTypeId, StoreSnapshot};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Constat d'écart entre un planning et le référentiel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// Créneau sous l'effectif requis.
    CoverageGap {
        date: NaiveDate,
        shift_type: ShiftTypeId,
        assigned: usize,
        required: usize,
    },
    /// Créneau au-dessus de l'effectif requis (la couverture est exacte).
    CoverageExcess {
        date: NaiveDate,
        shift_type: ShiftTypeId,
        assigned: usize,
        required: usize,
    },
    /// Plusieurs postes le même jour pour le même employé.
    DoubleBooking {
        date: NaiveDate,
        employee: EmployeeId,
        count: usize,
    },
    /// Enchaînement interdit entre deux jours ouvrés consécutifs.
    ForbiddenAdjacency {
        date: NaiveDate,
        employee: EmployeeId,
        prev: ShiftCode,
        next: ShiftCode,
    },
    /// Total mensuel hors de la bande d'équilibre.
    BalanceBreach {
        employee: EmployeeId,
        total: i64,
        floor: i64,
        ceiling: i64,
    },
    /// Entrée citant un employé absent des actifs du groupe.
    UnknownEmployee { employee: EmployeeId },
    /// Entrée citant un type de poste absent du groupe.
    UnknownShiftType { shift_type: ShiftTypeId },
}

impl Finding {
    pub fn kind(&self) -> &'static str {
        match self {
            Finding::CoverageGap { .. } => "coverage_gap",
            Finding::CoverageExcess { .. } => "coverage_excess",
            Finding::DoubleBooking { .. } => "double_booking",
            Finding::ForbiddenAdjacency { .. } => "forbidden_adjacency",
            Finding::BalanceBreach { .. } => "balance_breach",
            Finding::UnknownEmployee { .. } => "unknown_employee",
            Finding::UnknownShiftType { .. } => "unknown_shift_type",
        }
    }
}

/// Jours ouvrés du mois pour un groupe, avec le même repli que la
/// planification : masque absent, vide ou illisible vaut tous les jours.
pub fn operating_days_for(
    snapshot: &StoreSnapshot,
    group: &str,
    month: Month,
) -> Vec<NaiveDate> {
    let mask = snapshot
        .config_for(group)
        .map(|c| WeekdayMask::from_names(c.open_days.iter()).0)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(WeekdayMask::all);
    calendar::operating_days(month.first_day(), month.last_day(), &mask)
}

/// Confronte un planning au référentiel : couverture exacte, unicité
/// journalière, enchaînements interdits, bande d'équilibre, identifiants
/// connus. Renvoie tous les constats, dans un ordre stable.
pub fn check_schedule(
    snapshot: &StoreSnapshot,
    schedule: &MonthlySchedule,
    forbidden: &[(ShiftCode, ShiftCode)],
) -> Vec<Finding> {
    let mut findings = Vec::new();
    let employees = snapshot.active_employees(&schedule.group);
    let shift_types = snapshot.shift_types_for(&schedule.group);
    let operating_days = operating_days_for(snapshot, &schedule.group, schedule.month);

    let employee_ids: BTreeSet<EmployeeId> = employees.iter().map(|e| e.id).collect();
    let shift_ids: BTreeSet<ShiftTypeId> = shift_types.iter().map(|t| t.id).collect();

    let mut unknown_employees = BTreeSet::new();
    let mut unknown_shifts = BTreeSet::new();
    for entry in &schedule.entries {
        if !employee_ids.contains(&entry.employee) && unknown_employees.insert(entry.employee) {
            findings.push(Finding::UnknownEmployee {
                employee: entry.employee,
            });
        }
        if !shift_ids.contains(&entry.shift_type) && unknown_shifts.insert(entry.shift_type) {
            findings.push(Finding::UnknownShiftType {
                shift_type: entry.shift_type,
            });
        }
    }

    for day in &operating_days {
        for shift in &shift_types {
            let assigned = schedule
                .entries
                .iter()
                .filter(|e| e.date == *day && e.shift_type == shift.id)
                .count();
            let required = shift.headcount as usize;
            if assigned < required {
                findings.push(Finding::CoverageGap {
                    date: *day,
                    shift_type: shift.id,
                    assigned,
                    required,
                });
            } else if assigned > required {
                findings.push(Finding::CoverageExcess {
                    date: *day,
                    shift_type: shift.id,
                    assigned,
                    required,
                });
            }
        }
    }

    let mut per_day: BTreeMap<(EmployeeId, NaiveDate), usize> = BTreeMap::new();
    for entry in &schedule.entries {
        *per_day.entry((entry.employee, entry.date)).or_default() += 1;
    }
    for ((employee, date), count) in &per_day {
        if *count > 1 {
            findings.push(Finding::DoubleBooking {
                date: *date,
                employee: *employee,
                count: *count,
            });
        }
    }

    let code_of: BTreeMap<ShiftTypeId, ShiftCode> =
        shift_types.iter().map(|t| (t.id, t.code)).collect();
    for pair in operating_days.windows(2) {
        let (prev_day, day) = (pair[0], pair[1]);
        for employee in &employees {
            let held_before = codes_held(schedule, &code_of, employee.id, prev_day);
            let held_after = codes_held(schedule, &code_of, employee.id, day);
            for (prev, next) in forbidden {
                if held_before.contains(prev) && held_after.contains(next) {
                    findings.push(Finding::ForbiddenAdjacency {
                        date: day,
                        employee: employee.id,
                        prev: *prev,
                        next: *next,
                    });
                }
            }
        }
    }

    if !employees.is_empty() {
        let per_day_required: i64 = shift_types.iter().map(|t| i64::from(t.headcount)).sum();
        let total_slots = per_day_required * operating_days.len() as i64;
        let floor = total_slots / employees.len() as i64;
        let ceiling = floor + 1;
        for employee in &employees {
            let total = schedule
                .entries
                .iter()
                .filter(|e| e.employee == employee.id)
                .count() as i64;
            if total < floor || total > ceiling {
                findings.push(Finding::BalanceBreach {
                    employee: employee.id,
                    total,
                    floor,
                    ceiling,
                });
            }
        }
    }

    findings
}

fn codes_held(
    schedule: &MonthlySchedule,
    code_of: &BTreeMap<ShiftTypeId, ShiftCode>,
    employee: EmployeeId,
    day: NaiveDate,
) -> Vec<ShiftCode> {
    schedule
        .entries
        .iter()
        .filter(|e| e.employee == employee && e.date == day)
        .filter_map(|e| code_of.get(&e.shift_type).copied())
        .collect()
}
