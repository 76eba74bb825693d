use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::activity::ActivityLog;
use crate::task::Task;

/// File-backed stand-in for the external task/activity repository.
/// The engine never touches it; commands load a snapshot here, derive
/// from it, and (for activity mutations) hand the replacement log back.
#[derive(Debug)]
pub struct SnapshotStore {
    pub data_dir: PathBuf,
    pub tasks_path: PathBuf,
    pub activity_dir: PathBuf,
}

impl SnapshotStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let tasks_path = data_dir.join("tasks.json");
        let activity_dir = data_dir.join("activity");
        fs::create_dir_all(&activity_dir)
            .with_context(|| format!("failed to create {}", activity_dir.display()))?;

        if !tasks_path.exists() {
            fs::write(&tasks_path, "[]\n")?;
        }

        info!(
            data_dir = %data_dir.display(),
            tasks = %tasks_path.display(),
            activity = %activity_dir.display(),
            "opened snapshot store"
        );

        Ok(Self {
            data_dir,
            tasks_path,
            activity_dir,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load_tasks(&self) -> anyhow::Result<Vec<Task>> {
        let raw = fs::read_to_string(&self.tasks_path)
            .with_context(|| format!("failed to read {}", self.tasks_path.display()))?;
        let tasks: Vec<Task> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", self.tasks_path.display()))?;

        debug!(count = tasks.len(), "loaded task snapshot");
        Ok(tasks)
    }

    /// Loads one day's log; a day with no file is an empty log, not an
    /// error (a fresh grid is shown for any date).
    #[tracing::instrument(skip(self))]
    pub fn load_activity_log(&self, date_key: &str) -> anyhow::Result<ActivityLog> {
        let path = self.activity_path(date_key);
        if !path.exists() {
            debug!(date = date_key, "no activity log on disk; empty grid");
            return Ok(ActivityLog::empty(date_key));
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let log: ActivityLog = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        debug!(date = date_key, entries = log.activities.len(), "loaded activity log");
        Ok(log)
    }

    /// Replaces the whole day's log, matching the backend's
    /// one-document-per-day model. Atomic so an interrupted write
    /// never leaves a torn log.
    #[tracing::instrument(skip(self, log), fields(date = %log.date))]
    pub fn save_activity_log(&self, log: &ActivityLog) -> anyhow::Result<()> {
        let path = self.activity_path(&log.date);
        let mut temp = NamedTempFile::new_in(&self.activity_dir)?;
        serde_json::to_writer_pretty(&mut temp, log)
            .with_context(|| format!("failed to serialize activity log {}", log.date))?;
        temp.write_all(b"\n")?;
        temp.flush()?;
        temp.persist(&path)
            .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

        debug!(entries = log.activities.len(), "saved activity log");
        Ok(())
    }

    fn activity_path(&self, date_key: &str) -> PathBuf {
        self.activity_dir.join(format!("{date_key}.json"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::SnapshotStore;
    use crate::activity::{ActivityDraft, ActivityLog, Category, Hour, Mood};
    use crate::task::{Priority, Status, Task};

    #[test]
    fn open_seeds_empty_snapshot() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = SnapshotStore::open(dir.path()).expect("open store");

        assert!(store.tasks_path.exists());
        assert!(store.activity_dir.is_dir());
        assert!(store.load_tasks().expect("load tasks").is_empty());
    }

    #[test]
    fn loads_task_snapshot_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = SnapshotStore::open(dir.path()).expect("open store");

        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let tasks = vec![Task::new("persisted", Status::Pending, Priority::High, now)];
        let raw = serde_json::to_string(&tasks).expect("serialize tasks");
        std::fs::write(&store.tasks_path, raw).expect("write tasks");

        let loaded = store.load_tasks().expect("load tasks");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "persisted");
    }

    #[test]
    fn activity_log_round_trips() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = SnapshotStore::open(dir.path()).expect("open store");

        let log = ActivityLog::empty("2026-03-02")
            .upsert(
                Hour::new(11).expect("hour"),
                ActivityDraft {
                    activity: "focus block".to_string(),
                    category: Category::Work,
                    mood: Mood::Excellent,
                    productivity: 5,
                    notes: Some("no interruptions".to_string()),
                },
            )
            .expect("upsert");

        store.save_activity_log(&log).expect("save log");
        let loaded = store.load_activity_log("2026-03-02").expect("load log");
        assert_eq!(loaded, log);
    }

    #[test]
    fn missing_day_is_an_empty_log() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = SnapshotStore::open(dir.path()).expect("open store");

        let log = store.load_activity_log("2026-01-01").expect("load log");
        assert_eq!(log.date, "2026-01-01");
        assert!(log.activities.is_empty());
    }
}
