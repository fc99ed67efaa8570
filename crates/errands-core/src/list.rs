use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted task-list row as the store hands it back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListRecord {
    pub uid: Uuid,
    pub name: String,
}

impl ListRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uid: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    pub uid: Uuid,

    pub list_uid: Uuid,

    pub text: String,

    #[serde(default)]
    pub completed: bool,

    pub created: DateTime<Utc>,
}

impl TaskRecord {
    pub fn new(list_uid: Uuid, text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            uid: Uuid::new_v4(),
            list_uid,
            text: text.into(),
            completed: false,
            created: now,
        }
    }
}

/// One line of `errands.data`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    List(ListRecord),
    Task(TaskRecord),
}

impl Record {
    pub fn as_list(&self) -> Option<&ListRecord> {
        match self {
            Record::List(list) => Some(list),
            Record::Task(_) => None,
        }
    }

    pub fn as_task(&self) -> Option<&TaskRecord> {
        match self {
            Record::Task(task) => Some(task),
            Record::List(_) => None,
        }
    }

    /// True for the list itself and for every task filed under it.
    pub fn belongs_to(&self, list_uid: Uuid) -> bool {
        match self {
            Record::List(list) => list.uid == list_uid,
            Record::Task(task) => task.list_uid == list_uid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_tagged_by_kind() {
        let list = ListRecord::new("Work");
        let line = serde_json::to_string(&Record::List(list.clone())).expect("serialize");
        assert!(line.contains(r#""kind":"list""#));

        let parsed: Record = serde_json::from_str(&line).expect("parse");
        assert_eq!(parsed.as_list(), Some(&list));
        assert!(parsed.as_task().is_none());
    }

    #[test]
    fn completed_defaults_to_false() {
        let list_uid = Uuid::new_v4();
        let line = format!(
            r#"{{"kind":"task","uid":"{}","list_uid":"{}","text":"milk","created":"2024-05-01T10:00:00Z"}}"#,
            Uuid::new_v4(),
            list_uid
        );
        let parsed: Record = serde_json::from_str(&line).expect("parse");
        let task = parsed.as_task().expect("task record");
        assert!(!task.completed);
        assert!(parsed.belongs_to(list_uid));
    }
}
