use chrono::{Datelike, NaiveDate, Weekday};

/// Masque hebdomadaire des jours ouvrés (indexé 0 = lundi … 6 = dimanche)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdayMask {
    enabled: [bool; 7],
}

impl WeekdayMask {
    /// Tous les jours ouvrés.
    pub fn all() -> Self {
        Self { enabled: [true; 7] }
    }

    /// Aucun jour ouvré.
    pub fn none() -> Self {
        Self {
            enabled: [false; 7],
        }
    }

    /// Analyse des noms anglais de jours ("monday".."sunday", casse ignorée).
    /// Renvoie le masque et la liste des noms non reconnus, pour diagnostic.
    pub fn from_names<I, S>(names: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mask = Self::none();
        let mut unknown = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            match weekday_index(&name.to_ascii_lowercase()) {
                Some(idx) => mask.enabled[idx] = true,
                None => unknown.push(name.to_string()),
            }
        }
        (mask, unknown)
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.enabled[weekday.num_days_from_monday() as usize]
    }

    pub fn is_empty(&self) -> bool {
        !self.enabled.iter().any(|on| *on)
    }
}

fn weekday_index(name: &str) -> Option<usize> {
    match name {
        "monday" => Some(0),
        "tuesday" => Some(1),
        "wednesday" => Some(2),
        "thursday" => Some(3),
        "friday" => Some(4),
        "saturday" => Some(5),
        "sunday" => Some(6),
        _ => None,
    }
}

/// Jours ouvrés d'une plage inclusive : dates dont le jour de semaine est
/// activé dans le masque, en ordre chronologique. Fonction pure.
pub fn operating_days(from: NaiveDate, to: NaiveDate, mask: &WeekdayMask) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|day| *day <= to)
        .filter(|day| mask.contains(day.weekday()))
        .collect()
}
