use super::identity::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

/// An owned task, created only through a successful payment claim.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    /// Immutable after creation. Mutation, completion and deletion all
    /// require the caller to match this identity.
    pub owner: Identity,
}

impl Task {
    pub fn new(
        id: TaskId,
        name: String,
        description: String,
        due_date: Option<DateTime<Utc>>,
        owner: Identity,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            status: TaskStatus::Pending,
            created_at,
            due_date,
            owner,
        }
    }

    /// Pending -> Completed; terminal, there is no way back.
    pub fn complete(&mut self) {
        self.status = TaskStatus::Completed;
    }
}

/// Fields supplied by the claimer for the task a successful claim creates.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub name: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update applied by the owner.
///
/// `due_date` uses a nested option: unset leaves the current value
/// untouched, `Some(None)` explicitly clears it, `Some(Some(t))` replaces
/// it. An empty patch leaves the task unchanged.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn apply(self, task: &mut Task) {
        if let Some(name) = self.name {
            task.name = name;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
    }
}
