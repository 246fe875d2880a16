use crate::model::MonthlySchedule;
use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Persistance des plannings générés. Seul l'artefact est écrit ici :
/// le référentiel administratif reste en lecture seule.
pub trait Storage {
    /// Recharge un planning persisté.
    fn load(&self) -> anyhow::Result<MonthlySchedule>;
    /// Écrit de manière atomique (fichier temporaire puis renommage).
    fn save(&self, schedule: &MonthlySchedule) -> anyhow::Result<()>;
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<MonthlySchedule> {
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let schedule: MonthlySchedule =
            serde_json::from_slice(&data).with_context(|| "parsing schedule JSON")?;
        Ok(schedule)
    }

    fn save(&self, schedule: &MonthlySchedule) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(schedule)?;
        let mut tmp = NamedTempFile::new_in(self.path.parent().unwrap_or_else(|| Path::new(".")))
            .with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}
