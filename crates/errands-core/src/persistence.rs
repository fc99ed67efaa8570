//! Storage seams the sidebar and its task pages talk through.
//!
//! Every call takes typed identifiers and names. Backends never see a
//! pre-formatted command string.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::list::{ListRecord, TaskRecord};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("no stored record with id {0}")]
    NotFound(Uuid),

    #[error("storage operation failed: {0:#}")]
    Storage(#[from] anyhow::Error),
}

/// List-level operations the sidebar needs.
pub trait ListStore {
    /// Stores a new list and returns the identifier assigned to it.
    fn add_list(&mut self, name: &str) -> Result<Uuid, PersistenceError>;

    /// All lists in the order they were created.
    fn get_lists(&self) -> Result<Vec<ListRecord>, PersistenceError>;

    /// Removes the list and every task filed under it as one unit.
    fn delete_list(&mut self, uid: Uuid) -> Result<(), PersistenceError>;

    fn rename_list(&mut self, uid: Uuid, name: &str) -> Result<(), PersistenceError>;
}

/// Task-level operations used by the per-list detail pages.
pub trait TaskStore {
    fn tasks_for(&self, list_uid: Uuid) -> Result<Vec<TaskRecord>, PersistenceError>;

    fn add_task(&mut self, list_uid: Uuid, text: &str) -> Result<Uuid, PersistenceError>;

    fn set_task_completed(
        &mut self,
        task_uid: Uuid,
        completed: bool,
    ) -> Result<(), PersistenceError>;
}

/// Volatile backend, handy for embedding and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    lists: Vec<ListRecord>,
    tasks: Vec<TaskRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lists<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self {
            lists: names.into_iter().map(ListRecord::new).collect(),
            tasks: vec![],
        }
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl ListStore for MemoryStore {
    fn add_list(&mut self, name: &str) -> Result<Uuid, PersistenceError> {
        let record = ListRecord::new(name);
        let uid = record.uid;
        self.lists.push(record);
        debug!(%uid, name, "memory store added list");
        Ok(uid)
    }

    fn get_lists(&self) -> Result<Vec<ListRecord>, PersistenceError> {
        Ok(self.lists.clone())
    }

    fn delete_list(&mut self, uid: Uuid) -> Result<(), PersistenceError> {
        let idx = self
            .lists
            .iter()
            .position(|list| list.uid == uid)
            .ok_or(PersistenceError::NotFound(uid))?;
        self.lists.remove(idx);
        self.tasks.retain(|task| task.list_uid != uid);
        Ok(())
    }

    fn rename_list(&mut self, uid: Uuid, name: &str) -> Result<(), PersistenceError> {
        let list = self
            .lists
            .iter_mut()
            .find(|list| list.uid == uid)
            .ok_or(PersistenceError::NotFound(uid))?;
        list.name = name.to_string();
        Ok(())
    }
}

impl TaskStore for MemoryStore {
    fn tasks_for(&self, list_uid: Uuid) -> Result<Vec<TaskRecord>, PersistenceError> {
        Ok(self
            .tasks
            .iter()
            .filter(|task| task.list_uid == list_uid)
            .cloned()
            .collect())
    }

    fn add_task(&mut self, list_uid: Uuid, text: &str) -> Result<Uuid, PersistenceError> {
        if !self.lists.iter().any(|list| list.uid == list_uid) {
            return Err(PersistenceError::NotFound(list_uid));
        }
        let task = TaskRecord::new(list_uid, text, Utc::now());
        let uid = task.uid;
        self.tasks.push(task);
        Ok(uid)
    }

    fn set_task_completed(
        &mut self,
        task_uid: Uuid,
        completed: bool,
    ) -> Result<(), PersistenceError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.uid == task_uid)
            .ok_or(PersistenceError::NotFound(task_uid))?;
        task.completed = completed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_cascades_to_tasks() {
        let mut store = MemoryStore::with_lists(["Work", "Home"]);
        let lists = store.get_lists().expect("lists");
        let work = lists[0].uid;
        let home = lists[1].uid;

        store.add_task(work, "report").expect("add task");
        store.add_task(home, "dishes").expect("add task");
        assert_eq!(store.task_count(), 2);

        store.delete_list(work).expect("delete");
        assert_eq!(store.task_count(), 1);
        assert_eq!(store.get_lists().expect("lists").len(), 1);
        assert!(store.tasks_for(work).expect("tasks").is_empty());
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut store = MemoryStore::new();
        let ghost = Uuid::new_v4();

        assert!(matches!(
            store.delete_list(ghost),
            Err(PersistenceError::NotFound(id)) if id == ghost
        ));
        assert!(matches!(
            store.rename_list(ghost, "x"),
            Err(PersistenceError::NotFound(_))
        ));
        assert!(matches!(
            store.add_task(ghost, "x"),
            Err(PersistenceError::NotFound(_))
        ));
    }
}
