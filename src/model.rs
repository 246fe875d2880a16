use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifiant fort pour Employee
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmployeeId(u32);

impl EmployeeId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifiant fort pour ShiftType
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShiftTypeId(u32);

impl ShiftTypeId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ShiftTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Code à une lettre d'un type de poste : première lettre du nom, en majuscule
/// (ex. "Matin" → M). Résolu une fois au chargement, jamais recalculé ensuite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShiftCode(char);

impl ShiftCode {
    pub fn new(raw: char) -> Self {
        Self(raw.to_uppercase().next().unwrap_or(raw))
    }
    pub fn from_name(name: &str) -> Option<Self> {
        name.chars().next().map(Self::new)
    }
    pub fn as_char(&self) -> char {
        self.0
    }
}

impl fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Employé (référentiel administratif, lecture seule pour le cœur)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub group: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Employee {
    pub fn new<N: Into<String>, G: Into<String>>(id: EmployeeId, name: N, group: G) -> Self {
        Self {
            id,
            name: name.into(),
            group: group.into(),
            active: true,
        }
    }
}

/// Type de poste : effectif requis par occurrence (jour), code dérivé du nom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShiftType {
    pub id: ShiftTypeId,
    pub name: String,
    pub group: String,
    pub headcount: u32,
    pub code: ShiftCode,
}

impl ShiftType {
    /// Crée un type de poste en résolvant son code depuis le nom.
    pub fn new<N: Into<String>, G: Into<String>>(
        id: ShiftTypeId,
        name: N,
        group: G,
        headcount: u32,
    ) -> Result<Self, String> {
        let name = name.into();
        let code = ShiftCode::from_name(&name)
            .ok_or_else(|| "shift type name must not be empty".to_string())?;
        Ok(Self {
            id,
            name,
            group: group.into(),
            headcount,
            code,
        })
    }
}

/// Nature d'un segment du motif de roulement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Work,
    Rest,
}

/// Segment du motif cyclique : `days` jours consécutifs de travail ou de repos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRestSegment {
    pub kind: SegmentKind,
    pub days: u8,
}

impl WorkRestSegment {
    pub fn new(kind: SegmentKind, days: u8) -> Result<Self, String> {
        if days == 0 || days > 31 {
            return Err(format!("segment length must be in 1..=31, got {days}"));
        }
        Ok(Self { kind, days })
    }
}

/// Motif cyclique de roulement ancré sur une date de départ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationPlan {
    pub start: NaiveDate,
    pub pattern: Vec<WorkRestSegment>,
}

impl RotationPlan {
    /// Longueur totale du cycle (somme des segments).
    pub fn cycle_len(&self) -> u32 {
        self.pattern.iter().map(|s| u32::from(s.days)).sum()
    }
}

/// Configuration d'exploitation d'un groupe : jours ouvrés hebdomadaires
/// (noms anglais en minuscules), roulement optionnel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingConfig {
    pub group: String,
    #[serde(default)]
    pub open_days: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<RotationPlan>,
}

/// Nature d'une absence déclarée
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceKind {
    Vacation,
    DayOff,
    Sick,
}

/// Absence déclarée d'un employé (plage de dates inclusive)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    pub employee: EmployeeId,
    pub kind: AbsenceKind,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Absence {
    pub fn new(
        employee: EmployeeId,
        kind: AbsenceKind,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Self, String> {
        if to < from {
            return Err("absence end must not precede start".to_string());
        }
        Ok(Self {
            employee,
            kind,
            from,
            to,
        })
    }

    /// Itère toutes les dates couvertes, bornes incluses.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let to = self.to;
        self.from.iter_days().take_while(move |d| *d <= to)
    }
}

/// Jours de repos imposés, par employé. Reconstruit à chaque exécution,
/// muté en place par le roulement puis par la réparation ; jamais persisté.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayOffSet {
    off: BTreeMap<EmployeeId, BTreeSet<NaiveDate>>,
}

impl DayOffSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, employee: EmployeeId, day: NaiveDate) {
        self.off.entry(employee).or_default().insert(day);
    }

    /// Retire un repos ; renvoie `true` si l'entrée existait.
    pub fn revoke(&mut self, employee: EmployeeId, day: NaiveDate) -> bool {
        self.off
            .get_mut(&employee)
            .map_or(false, |days| days.remove(&day))
    }

    pub fn is_off(&self, employee: EmployeeId, day: NaiveDate) -> bool {
        self.off
            .get(&employee)
            .map_or(false, |days| days.contains(&day))
    }

    pub fn count_for(&self, employee: EmployeeId) -> usize {
        self.off.get(&employee).map_or(0, BTreeSet::len)
    }

    pub fn days_for(&self, employee: EmployeeId) -> Vec<NaiveDate> {
        self.off
            .get(&employee)
            .map_or_else(Vec::new, |days| days.iter().copied().collect())
    }

    pub fn total(&self) -> usize {
        self.off.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Profil idéal : cibles de postes par employé et par code, utilisé
/// uniquement comme objectif souple (jamais une contrainte dure).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdealProfile {
    targets: BTreeMap<EmployeeId, BTreeMap<ShiftCode, u32>>,
}

impl IdealProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, employee: EmployeeId, code: ShiftCode, count: u32) {
        self.targets.entry(employee).or_default().insert(code, count);
    }

    /// Cible pour (employé, code) ; 0 si absente.
    pub fn target(&self, employee: EmployeeId, code: ShiftCode) -> u32 {
        self.targets
            .get(&employee)
            .and_then(|by_code| by_code.get(&code))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Profil idéal tel que fourni de l'extérieur : cibles par nom d'employé
/// puis par nom de poste. La résolution vers les identifiants se fait à
/// la planification, pas au chargement.
pub type NamedProfile = BTreeMap<String, BTreeMap<String, u32>>;

/// Mois calendaire valide (représenté par son premier jour)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Month(NaiveDate);

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self, String> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or_else(|| format!("invalid calendar month: {year}-{month:02}"))
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// Dernier jour du mois (veille du premier jour du mois suivant).
    pub fn last_day(&self) -> NaiveDate {
        self.0
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(self.0)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0.year(), self.0.month())
    }
}

impl FromStr for Month {
    type Err = String;

    /// Analyse le format `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got: {s}"))?;
        let year: i32 = year.parse().map_err(|_| format!("invalid year in: {s}"))?;
        let month: u32 = month.parse().map_err(|_| format!("invalid month in: {s}"))?;
        Self::new(year, month)
    }
}

/// Une affectation décidée : employé, type de poste, date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentEntry {
    pub employee: EmployeeId,
    pub shift_type: ShiftTypeId,
    pub date: NaiveDate,
}

/// Sortie du cœur : collection ordonnée (jour, puis poste, puis employé)
/// d'affectations couvrant exactement les effectifs requis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub entries: Vec<AssignmentEntry>,
}

impl Assignment {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nombre d'employés affectés à (jour, poste).
    pub fn count_for(&self, date: NaiveDate, shift_type: ShiftTypeId) -> usize {
        self.entries
            .iter()
            .filter(|e| e.date == date && e.shift_type == shift_type)
            .count()
    }

    /// Total de postes d'un employé sur l'horizon.
    pub fn total_for(&self, employee: EmployeeId) -> usize {
        self.entries.iter().filter(|e| e.employee == employee).count()
    }
}

/// Artefact persistable : l'affectation validée d'un mois, avec métadonnées
/// de génération (identifiant d'exécution, horodatage).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySchedule {
    pub group: String,
    pub month: Month,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<AssignmentEntry>,
}

impl MonthlySchedule {
    pub fn new<G: Into<String>>(group: G, month: Month, assignment: Assignment) -> Self {
        Self {
            group: group.into(),
            month,
            run_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            entries: assignment.entries,
        }
    }
}

/// Image mémoire du référentiel administratif, chargée en lecture seule
/// avant l'orchestration. Le cœur n'y accède jamais pendant un calcul.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub employees: Vec<Employee>,
    pub shift_types: Vec<ShiftType>,
    pub configs: Vec<OperatingConfig>,
    pub absences: Vec<Absence>,
}

impl StoreSnapshot {
    /// Employés actifs du groupe, dans l'ordre du référentiel.
    pub fn active_employees(&self, group: &str) -> Vec<Employee> {
        self.employees
            .iter()
            .filter(|e| e.active && e.group == group)
            .cloned()
            .collect()
    }

    /// Types de poste du groupe, dans l'ordre du référentiel.
    pub fn shift_types_for(&self, group: &str) -> Vec<ShiftType> {
        self.shift_types
            .iter()
            .filter(|t| t.group == group)
            .cloned()
            .collect()
    }

    pub fn config_for(&self, group: &str) -> Option<&OperatingConfig> {
        self.configs.iter().find(|c| c.group == group)
    }

    pub fn find_employee(&self, id: EmployeeId) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    pub fn find_shift_type(&self, id: ShiftTypeId) -> Option<&ShiftType> {
        self.shift_types.iter().find(|t| t.id == id)
    }
}
