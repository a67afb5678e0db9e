//! Task identifiers, task states and the views handed back to clients.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque unique task identifier (a UUID v4 string).
///
/// Clients send ids back as arbitrary strings, so any string converts into
/// a `TaskId`; only ids allocated with [`TaskId::generate`] ever exist in
/// the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Allocate a fresh id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lifecycle of a task inside the store.
///
/// `Pending → Translating → {Completed | Failed}`. Exactly one terminal
/// state is ever written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Queued, not yet picked up by the worker.
    Pending,
    /// The worker is resolving the model or translating.
    Translating,
    /// Finished with a translation (or an "unsupported pair" message).
    Completed(String),
    /// Finished with a short, human-readable error description.
    Failed(String),
}

impl TaskStatus {
    /// Whether this is `Completed` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }
}

/// What a client sees when polling a task.
///
/// Serializes to the wire shapes
/// `{"status":"processing"}`, `{"status":"completed","translation":..}`
/// and `{"status":"error","message":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskView {
    Processing,
    Completed { translation: String },
    Error { message: String },
}

impl TaskView {
    /// Whether the task has finished (successfully or not).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

/// What a client sees right after submitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmitResponse {
    /// Queued; poll with `task_id`.
    Processing { task_id: TaskId },
    /// Answered synchronously (empty input).
    Completed { translation: String },
}

impl SubmitResponse {
    /// The task id to poll, if the request was queued.
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Self::Processing { task_id } => Some(task_id),
            Self::Completed { .. } => None,
        }
    }
}
