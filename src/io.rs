use crate::model::{
    Absence, Employee, MonthlySchedule, NamedProfile, OperatingConfig, ShiftType, ShiftTypeId,
    StoreSnapshot,
};
use anyhow::{bail, Context};
use csv::WriterBuilder;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Document référentiel tel qu'écrit par la couche d'administration.
/// Le code des types de poste n'y figure pas : il est résolu une fois
/// au chargement, jamais recalculé ailleurs.
#[derive(Deserialize)]
struct RawStore {
    #[serde(default)]
    employees: Vec<Employee>,
    #[serde(default)]
    shift_types: Vec<RawShiftType>,
    #[serde(default)]
    configs: Vec<OperatingConfig>,
    #[serde(default)]
    absences: Vec<Absence>,
}

#[derive(Deserialize)]
struct RawShiftType {
    id: ShiftTypeId,
    name: String,
    group: String,
    headcount: u32,
}

/// Charge et valide un instantané du référentiel (JSON).
pub fn load_store<P: AsRef<Path>>(path: P) -> anyhow::Result<StoreSnapshot> {
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("cannot read store file: {}", path.as_ref().display()))?;
    let store: RawStore = serde_json::from_str(&raw).context("invalid store JSON")?;

    for employee in &store.employees {
        if employee.name.trim().is_empty() {
            bail!("employee {} has an empty name", employee.id);
        }
        if employee.group.trim().is_empty() {
            bail!("employee {} has an empty group", employee.id);
        }
    }

    let mut shift_types = Vec::with_capacity(store.shift_types.len());
    for raw in store.shift_types {
        let RawShiftType {
            id,
            name,
            group,
            headcount,
        } = raw;
        let shift_type = ShiftType::new(id, name, group, headcount)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid shift type {id}"))?;
        shift_types.push(shift_type);
    }

    for absence in &store.absences {
        if absence.to < absence.from {
            bail!("absence of employee {} ends before it starts", absence.employee);
        }
    }

    for config in &store.configs {
        if let Some(plan) = &config.rotation {
            for segment in &plan.pattern {
                if segment.days == 0 || segment.days > 31 {
                    bail!(
                        "rotation segment length out of range (1..=31) for group {}",
                        config.group
                    );
                }
            }
        }
    }

    Ok(StoreSnapshot {
        employees: store.employees,
        shift_types,
        configs: store.configs,
        absences: store.absences,
    })
}

/// Charge un profil idéal `{"Nom": {"Poste": cible}}` (JSON).
pub fn load_profile<P: AsRef<Path>>(path: P) -> anyhow::Result<NamedProfile> {
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("cannot read profile file: {}", path.as_ref().display()))?;
    let profile: NamedProfile = serde_json::from_str(&raw).context("invalid profile JSON")?;
    Ok(profile)
}

/// Export CSV d'un planning : header `date,shift,employee_id,employee`.
/// Les noms sont résolus depuis le référentiel, vides s'ils n'y sont plus.
pub fn export_schedule_csv<P: AsRef<Path>>(
    path: P,
    schedule: &MonthlySchedule,
    snapshot: &StoreSnapshot,
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["date", "shift", "employee_id", "employee"])?;
    let mut id_buf = itoa::Buffer::new();
    for entry in &schedule.entries {
        let date = entry.date.format("%Y-%m-%d").to_string();
        let shift = snapshot
            .find_shift_type(entry.shift_type)
            .map(|t| t.name.as_str())
            .unwrap_or("");
        let employee = snapshot
            .find_employee(entry.employee)
            .map(|e| e.name.as_str())
            .unwrap_or("");
        w.write_record([
            date.as_str(),
            shift,
            id_buf.format(entry.employee.get()),
            employee,
        ])?;
    }
    w.flush()?;
    Ok(())
}
