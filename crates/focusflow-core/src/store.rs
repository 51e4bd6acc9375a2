use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::migrate;
use crate::task::Task;

/// Best-effort JSON persistence under a data directory. Reads degrade to
/// empty defaults so corrupt or missing files never block a view; writes
/// are atomic and do propagate failures.
#[derive(Debug)]
pub struct Store {
    pub data_dir: PathBuf,
    pub tasks_path: PathBuf,
    pub filter_path: PathBuf,
}

/// The only filter state that survives a session. The view date is
/// deliberately absent: every launch starts on today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterPrefs {
    pub show_completed: bool,
    pub show_archived: bool,
}

impl Store {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let tasks_path = data_dir.join("tasks.json");
        let filter_path = data_dir.join("filter.json");

        if !tasks_path.exists() {
            fs::write(&tasks_path, "[]")?;
        }
        if !filter_path.exists() {
            let defaults = serde_json::to_string(&FilterPrefs::default())?;
            fs::write(&filter_path, defaults)?;
        }

        info!(
            data_dir = %data_dir.display(),
            tasks = %tasks_path.display(),
            filter = %filter_path.display(),
            "opened store"
        );

        Ok(Self {
            data_dir,
            tasks_path,
            filter_path,
        })
    }

    /// Load the task collection, running the legacy migrator over whatever
    /// shape is on disk. Unreadable storage yields an empty collection.
    #[tracing::instrument(skip(self, now))]
    pub fn load_tasks(&self, now: DateTime<Utc>) -> Vec<Task> {
        let records = match self.load_records() {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "task storage unreadable; starting empty");
                return vec![];
            }
        };

        if migrate::needs_migration(&records) {
            info!(count = records.len(), "legacy task records detected");
        }
        migrate::migrate(&records, now)
    }

    fn load_records(&self) -> anyhow::Result<Vec<Value>> {
        let raw = fs::read_to_string(&self.tasks_path)
            .with_context(|| format!("failed reading {}", self.tasks_path.display()))?;
        let records: Vec<Value> = serde_json::from_str(&raw)
            .with_context(|| format!("failed parsing {}", self.tasks_path.display()))?;
        debug!(count = records.len(), "loaded raw task records");
        Ok(records)
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn save_tasks(&self, tasks: &[Task]) -> anyhow::Result<()> {
        save_json_atomic(&self.tasks_path, tasks).context("failed to save tasks.json")
    }

    #[tracing::instrument(skip(self))]
    pub fn load_filter_prefs(&self) -> FilterPrefs {
        let raw = match fs::read_to_string(&self.filter_path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "filter prefs unreadable; using defaults");
                return FilterPrefs::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(error = %err, "filter prefs corrupt; using defaults");
                FilterPrefs::default()
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn save_filter_prefs(&self, prefs: FilterPrefs) -> anyhow::Result<()> {
        save_json_atomic(&self.filter_path, &prefs).context("failed to save filter.json")
    }
}

#[tracing::instrument(skip(path, payload))]
fn save_json_atomic<T: Serialize + ?Sized>(path: &Path, payload: &T) -> anyhow::Result<()> {
    debug!(file = %path.display(), "saving json atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    let serialized = serde_json::to_string_pretty(payload)?;
    temp.write_all(serialized.as_bytes())?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
