use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::Utc;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use crate::list::{ListRecord, Record, TaskRecord};
use crate::persistence::{ListStore, PersistenceError, TaskStore};

/// File-backed store: every list and task lives as one JSON line in
/// `errands.data`, rewritten atomically on each mutation.
#[derive(Debug)]
pub struct DataStore {
    pub data_dir: PathBuf,
    pub data_path: PathBuf,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let data_path = data_dir.join("errands.data");
        if !data_path.exists() {
            fs::write(&data_path, "")?;
        }

        info!(
            data_dir = %data_dir.display(),
            data = %data_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            data_path,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> anyhow::Result<Vec<Record>> {
        load_jsonl(&self.data_path).context("failed to load errands.data")
    }

    #[tracing::instrument(skip(self, records))]
    pub fn save(&self, records: &[Record]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.data_path, records).context("failed to save errands.data")
    }

    /// Loads, edits and writes back in one pass. Nothing is written when
    /// `edit` fails.
    fn update<T>(
        &self,
        edit: impl FnOnce(&mut Vec<Record>) -> Result<T, PersistenceError>,
    ) -> Result<T, PersistenceError> {
        let mut records = self.load()?;
        let out = edit(&mut records)?;
        self.save(&records)?;
        Ok(out)
    }
}

impl ListStore for DataStore {
    #[tracing::instrument(skip(self))]
    fn add_list(&mut self, name: &str) -> Result<Uuid, PersistenceError> {
        let record = ListRecord::new(name);
        let uid = record.uid;
        self.update(|records| {
            records.push(Record::List(record));
            Ok(())
        })?;
        info!(%uid, name, "stored new list");
        Ok(uid)
    }

    #[tracing::instrument(skip(self))]
    fn get_lists(&self) -> Result<Vec<ListRecord>, PersistenceError> {
        let lists: Vec<ListRecord> = self
            .load()?
            .iter()
            .filter_map(Record::as_list)
            .cloned()
            .collect();
        debug!(count = lists.len(), "loaded lists");
        Ok(lists)
    }

    #[tracing::instrument(skip(self), fields(uid = %uid))]
    fn delete_list(&mut self, uid: Uuid) -> Result<(), PersistenceError> {
        let removed = self.update(|records| {
            if !records.iter().any(|rec| rec.as_list().is_some_and(|l| l.uid == uid)) {
                return Err(PersistenceError::NotFound(uid));
            }
            let before = records.len();
            records.retain(|rec| !rec.belongs_to(uid));
            Ok(before - records.len())
        })?;
        info!(removed_tasks = removed.saturating_sub(1), "deleted list and its tasks");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(uid = %uid))]
    fn rename_list(&mut self, uid: Uuid, name: &str) -> Result<(), PersistenceError> {
        self.update(|records| {
            let list = records
                .iter_mut()
                .find_map(|rec| match rec {
                    Record::List(list) if list.uid == uid => Some(list),
                    _ => None,
                })
                .ok_or(PersistenceError::NotFound(uid))?;
            list.name = name.to_string();
            Ok(())
        })?;
        info!(name, "renamed stored list");
        Ok(())
    }
}

impl TaskStore for DataStore {
    #[tracing::instrument(skip(self), fields(list_uid = %list_uid))]
    fn tasks_for(&self, list_uid: Uuid) -> Result<Vec<TaskRecord>, PersistenceError> {
        Ok(self
            .load()?
            .iter()
            .filter_map(Record::as_task)
            .filter(|task| task.list_uid == list_uid)
            .cloned()
            .collect())
    }

    #[tracing::instrument(skip(self), fields(list_uid = %list_uid))]
    fn add_task(&mut self, list_uid: Uuid, text: &str) -> Result<Uuid, PersistenceError> {
        let task = TaskRecord::new(list_uid, text, Utc::now());
        let uid = task.uid;
        self.update(|records| {
            if !records
                .iter()
                .any(|rec| rec.as_list().is_some_and(|l| l.uid == list_uid))
            {
                return Err(PersistenceError::NotFound(list_uid));
            }
            records.push(Record::Task(task));
            Ok(())
        })?;
        info!(task_uid = %uid, "stored new task");
        Ok(uid)
    }

    #[tracing::instrument(skip(self), fields(task_uid = %task_uid))]
    fn set_task_completed(
        &mut self,
        task_uid: Uuid,
        completed: bool,
    ) -> Result<(), PersistenceError> {
        self.update(|records| {
            let task = records
                .iter_mut()
                .find_map(|rec| match rec {
                    Record::Task(task) if task.uid == task_uid => Some(task),
                    _ => None,
                })
                .ok_or(PersistenceError::NotFound(task_uid))?;
            task.completed = completed;
            Ok(())
        })
    }
}

#[tracing::instrument(skip(path))]
fn load_jsonl(path: &Path) -> anyhow::Result<Vec<Record>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: Record = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(record);
    }

    debug!(count = out.len(), "loaded records from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, records))]
fn save_jsonl_atomic(path: &Path, records: &[Record]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = records.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for record in records {
        let serialized = serde_json::to_string(record)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
