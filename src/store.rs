//! Task store: task id → task state, read at most once.
//!
//! Submitters register tasks as `Pending`, the worker moves them through
//! `Translating` to exactly one terminal state, and pollers consume terminal
//! states: the first poll that observes `Completed`/`Failed` removes the
//! entry, so a result can be read at most once and a second poll reports
//! "not found".
//!
//! # Expiry
//!
//! By default entries never expire. A task that is never polled stays in
//! memory until the process restarts; the footprint is bounded only by
//! request volume. Deployments that prefer bounded memory can opt into a
//! time-to-live with [`TaskStore::with_ttl`]. The TTL only applies to
//! finished tasks and counts from the moment the result was recorded; a task
//! that is still queued or translating never expires, however long the
//! worker takes. An expired result polls as "not found".
//!
//! Backed by a moka concurrent cache, so pollers on caller threads can read
//! while the worker writes.

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;
use tracing::{debug, warn};

use crate::types::{LanguagePair, TaskId, TaskStatus, TaskView, TranslationRequest};
use crate::{Result, TolkError};

/// A stored task.
#[derive(Debug, Clone)]
struct TaskRecord {
    pair: LanguagePair,
    status: TaskStatus,
    submitted_at: Instant,
}

/// Expires finished tasks `ttl` after their terminal write, never unfinished ones.
struct TerminalExpiry {
    ttl: Duration,
}

impl TerminalExpiry {
    fn ttl_for(&self, record: &TaskRecord) -> Option<Duration> {
        record.status.is_terminal().then_some(self.ttl)
    }
}

impl Expiry<TaskId, TaskRecord> for TerminalExpiry {
    fn expire_after_create(
        &self,
        _id: &TaskId,
        record: &TaskRecord,
        _created_at: Instant,
    ) -> Option<Duration> {
        self.ttl_for(record)
    }

    fn expire_after_update(
        &self,
        _id: &TaskId,
        record: &TaskRecord,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        self.ttl_for(record)
    }
}

/// Concurrent task id → task state map.
///
/// Cloning is cheap and clones share the same underlying storage.
#[derive(Clone)]
pub struct TaskStore {
    tasks: Cache<TaskId, TaskRecord>,
}

impl TaskStore {
    /// Create a store whose entries never expire.
    pub fn new() -> Self {
        Self {
            tasks: Cache::builder().build(),
        }
    }

    /// Create a store whose finished tasks expire `ttl` after completion.
    ///
    /// Pending and translating tasks are kept until they finish.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            tasks: Cache::builder()
                .expire_after(TerminalExpiry { ttl })
                .build(),
        }
    }

    /// Register a freshly submitted task as `Pending`.
    pub fn put(&self, id: &TaskId, request: &TranslationRequest) {
        debug!(task_id = %id, pair = %request.pair, "task registered");
        self.tasks.insert(
            id.clone(),
            TaskRecord {
                pair: request.pair.clone(),
                status: TaskStatus::Pending,
                submitted_at: Instant::now(),
            },
        );
    }

    /// Move a `Pending` task to `Translating`.
    ///
    /// Returns `false` (and changes nothing) if the task is unknown or not pending.
    pub fn mark_translating(&self, id: &TaskId) -> bool {
        match self.tasks.get(id) {
            Some(mut record) if record.status == TaskStatus::Pending => {
                record.status = TaskStatus::Translating;
                self.tasks.insert(id.clone(), record);
                true
            }
            _ => false,
        }
    }

    /// Record a successful result.
    ///
    /// Returns `false` if the task already reached a terminal state.
    pub fn complete(&self, id: &TaskId, translation: impl Into<String>) -> bool {
        self.finish(id, TaskStatus::Completed(translation.into()))
    }

    /// Record a failure with a short, human-readable description.
    ///
    /// Returns `false` if the task already reached a terminal state.
    pub fn fail(&self, id: &TaskId, message: impl Into<String>) -> bool {
        self.finish(id, TaskStatus::Failed(message.into()))
    }

    /// Current status without consuming anything.
    pub fn status(&self, id: &TaskId) -> Option<TaskStatus> {
        self.tasks.get(id).map(|record| record.status)
    }

    /// Report a task to a poller.
    ///
    /// `Processing` while pending or translating. The first observation of a
    /// terminal state returns it **and removes the entry**. Unknown, expired
    /// or already consumed ids fail with [`TolkError::TaskNotFound`].
    pub fn peek_or_consume(&self, id: &TaskId) -> Result<TaskView> {
        let record = self
            .tasks
            .get(id)
            .ok_or_else(|| TolkError::TaskNotFound(id.to_string()))?;

        if !record.status.is_terminal() {
            return Ok(TaskView::Processing);
        }

        // A concurrent poller may have consumed it between get and remove.
        let record = self
            .tasks
            .remove(id)
            .ok_or_else(|| TolkError::TaskNotFound(id.to_string()))?;

        debug!(
            task_id = %id,
            pair = %record.pair,
            age_ms = record.submitted_at.elapsed().as_millis() as u64,
            "task consumed"
        );

        Ok(match record.status {
            TaskStatus::Completed(translation) => TaskView::Completed { translation },
            TaskStatus::Failed(message) => TaskView::Error { message },
            TaskStatus::Pending | TaskStatus::Translating => TaskView::Processing,
        })
    }

    /// Drop a task regardless of its state.
    pub fn remove(&self, id: &TaskId) -> bool {
        self.tasks.remove(id).is_some()
    }

    /// Number of tracked tasks.
    ///
    /// Approximate under concurrent writes; exact once pending maintenance ran.
    pub fn len(&self) -> u64 {
        self.tasks.run_pending_tasks();
        self.tasks.entry_count()
    }

    /// Whether no task is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn finish(&self, id: &TaskId, status: TaskStatus) -> bool {
        let mut record = match self.tasks.get(id) {
            Some(record) if record.status.is_terminal() => {
                warn!(task_id = %id, "ignoring second terminal write");
                return false;
            }
            Some(record) => record,
            None => {
                warn!(task_id = %id, "terminal write for unknown task");
                return false;
            }
        };
        record.status = status;
        self.tasks.insert(id.clone(), record);
        true
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}
