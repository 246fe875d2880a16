#![forbid(unsafe_code)]
use chrono::{NaiveDate, Weekday};
use roulement::calendar::{operating_days, WeekdayMask};
use roulement::model::{
    DayOffSet, Employee, EmployeeId, RotationPlan, SegmentKind, WorkRestSegment,
};
use roulement::repair::{repair_days_off, Revocation};
use roulement::rotation::apply_rotation;

#[test]
fn weekday_mask_parses_known_names_and_reports_unknown() {
    let (mask, unknown) = WeekdayMask::from_names(["Monday", "sunday", "Funday"]);
    assert!(mask.contains(Weekday::Mon));
    assert!(mask.contains(Weekday::Sun));
    assert!(!mask.contains(Weekday::Tue));
    assert_eq!(unknown, vec!["Funday".to_string()]);
}

#[test]
fn empty_name_list_gives_empty_mask() {
    let (mask, unknown) = WeekdayMask::from_names(Vec::<String>::new());
    assert!(mask.is_empty());
    assert!(unknown.is_empty());

    let from: NaiveDate = "2025-09-01".parse().unwrap();
    let to: NaiveDate = "2025-09-07".parse().unwrap();
    assert!(operating_days(from, to, &mask).is_empty());
}

#[test]
fn operating_days_keep_only_masked_weekdays_in_order() {
    let (mask, _) = WeekdayMask::from_names(["monday", "tuesday"]);
    let from: NaiveDate = "2025-09-01".parse().unwrap();
    let to: NaiveDate = "2025-09-14".parse().unwrap();
    let days = operating_days(from, to, &mask);
    let expected: Vec<NaiveDate> = ["2025-09-01", "2025-09-02", "2025-09-08", "2025-09-09"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();
    assert_eq!(days, expected);
}

#[test]
fn rotation_is_deterministic() {
    let employees = staff(3);
    let days = days_from("2025-09-01", 9);
    let plan = work2_rest1("2025-09-01");

    let mut first = DayOffSet::new();
    let report_a = apply_rotation(&employees, &days, &plan, &mut first);
    let mut second = DayOffSet::new();
    let report_b = apply_rotation(&employees, &days, &plan, &mut second);

    assert_eq!(first, second);
    assert_eq!(report_a, report_b);
}

#[test]
fn rotation_spreads_cycle_starts_across_staff() {
    let employees = staff(3);
    let days = days_from("2025-09-01", 9);
    let plan = work2_rest1("2025-09-01");
    let mut days_off = DayOffSet::new();
    let report = apply_rotation(&employees, &days, &plan, &mut days_off);

    // cycle 3, décalages 0/1/2 : exactement un employé au repos chaque jour
    for day in &days {
        let resting = employees
            .iter()
            .filter(|e| days_off.is_off(e.id, *day))
            .count();
        assert_eq!(resting, 1, "expected one resting employee on {day}");
    }
    for employee in &employees {
        assert_eq!(days_off.count_for(employee.id), 3);
    }
    assert_eq!(report.rest_days_granted, 9);
    assert_eq!(report.employees_affected, 3);
}

#[test]
fn rotation_handles_days_before_the_anchor() {
    let employees = staff(1);
    let day: NaiveDate = "2025-09-09".parse().unwrap();
    let plan = work2_rest1("2025-09-10");
    let mut days_off = DayOffSet::new();
    let report = apply_rotation(&employees, &[day], &plan, &mut days_off);

    // un jour avant l'ancre : position (-1).rem_euclid(3) = 2, donc repos
    assert!(days_off.is_off(EmployeeId::new(1), day));
    assert_eq!(report.rest_days_granted, 1);
}

#[test]
fn repair_revokes_the_heaviest_rester_first() {
    let employees = staff(3);
    let days = days_from("2025-09-01", 2);
    let mut days_off = DayOffSet::new();
    days_off.grant(EmployeeId::new(1), days[0]);
    days_off.grant(EmployeeId::new(1), days[1]);
    days_off.grant(EmployeeId::new(2), days[0]);

    let report = repair_days_off(&employees, &days, 2, &mut days_off);

    assert_eq!(
        report.revocations,
        vec![Revocation {
            employee: EmployeeId::new(1),
            day: days[0],
        }]
    );
    assert!(!days_off.is_off(EmployeeId::new(1), days[0]));
    assert!(days_off.is_off(EmployeeId::new(2), days[0]));
    assert!(days_off.is_off(EmployeeId::new(1), days[1]));
    assert_eq!(report.required_total, 4);
    assert_eq!(report.available_total, 4);
    assert!(report.short_days.is_empty());
}

#[test]
fn repair_stops_as_soon_as_requirement_is_met() {
    let employees = staff(4);
    let days = days_from("2025-09-01", 3);
    let mut days_off = DayOffSet::new();
    days_off.grant(EmployeeId::new(1), days[0]);
    days_off.grant(EmployeeId::new(2), days[0]);
    days_off.grant(EmployeeId::new(3), days[1]);

    let before = days_off.total();
    let report = repair_days_off(&employees, &days, 3, &mut days_off);

    // jour 0 : déficit 1, égalité de cumuls, l'id le plus petit cède
    assert_eq!(
        report.revocations,
        vec![Revocation {
            employee: EmployeeId::new(1),
            day: days[0],
        }]
    );
    // jamais de repos ajouté, et rien retiré au-delà du nécessaire
    assert!(days_off.total() <= before);
    assert!(days_off.is_off(EmployeeId::new(2), days[0]));
    assert!(days_off.is_off(EmployeeId::new(3), days[1]));
    assert!(report.short_days.is_empty());
}

#[test]
fn repair_reports_days_the_group_cannot_cover() {
    let employees = staff(2);
    let days = days_from("2025-09-01", 2);
    let mut days_off = DayOffSet::new();

    let report = repair_days_off(&employees, &days, 3, &mut days_off);

    assert!(report.revocations.is_empty());
    assert_eq!(report.short_days, days);
    assert_eq!(report.required_total, 6);
    assert_eq!(report.available_total, 4);
}

#[test]
fn rotation_then_repair_restores_full_availability() {
    let employees = staff(3);
    let days = days_from("2025-09-01", 9);
    let plan = work2_rest1("2025-09-01");
    let mut days_off = DayOffSet::new();
    apply_rotation(&employees, &days, &plan, &mut days_off);

    let report = repair_days_off(&employees, &days, 3, &mut days_off);

    // 3 requis chaque jour pour 3 employés : chaque repos accordé saute
    assert_eq!(report.revocations.len(), 9);
    assert!(days_off.is_empty());
    for day in &days {
        let available = employees
            .iter()
            .filter(|e| !days_off.is_off(e.id, *day))
            .count();
        assert_eq!(available, 3);
    }
    assert_eq!(report.available_total, 27);
    assert_eq!(report.available_total, report.required_total);
}

fn staff(n: u32) -> Vec<Employee> {
    (1..=n)
        .map(|i| Employee::new(EmployeeId::new(i), format!("E{i}"), "ops"))
        .collect()
}

fn days_from(start: &str, count: usize) -> Vec<NaiveDate> {
    let start: NaiveDate = start.parse().unwrap();
    start.iter_days().take(count).collect()
}

fn work2_rest1(start: &str) -> RotationPlan {
    RotationPlan {
        start: start.parse().unwrap(),
        pattern: vec![
            WorkRestSegment::new(SegmentKind::Work, 2).unwrap(),
            WorkRestSegment::new(SegmentKind::Rest, 1).unwrap(),
        ],
    }
}
