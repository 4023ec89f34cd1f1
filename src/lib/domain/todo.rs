use chrono::{DateTime, Utc};
use serde::Serialize;

use super::id::TodoKey;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo<K: TodoKey> {
    pub id: K,
    pub task: String,
    pub completed: bool,
    // Only document stores track timestamps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A todo that has not been stored yet; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub task: String,
    pub completed: bool,
}

impl NewTodo {
    /// A fresh todo always starts out incomplete.
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            completed: false,
        }
    }

    pub fn with_status(task: impl Into<String>, completed: bool) -> Self {
        Self {
            task: task.into(),
            completed,
        }
    }
}

/// Fields to merge into a stored todo. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub task: Option<String>,
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.task.is_none() && self.completed.is_none()
    }

    pub fn apply_to<K: TodoKey>(self, todo: &mut Todo<K>) {
        if let Some(task) = self.task {
            todo.task = task;
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
    }
}
