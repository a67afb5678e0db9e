//! The translation service facade.
//!
//! [`TranslationService`] is what an HTTP layer holds: it accepts requests,
//! hands back a task id immediately, and answers polls from the task store.
//! It never waits for a translation. The heavy lifting happens on the
//! background worker task it spawned at build time.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tolk::{TaskView, TranslationService};
//! # async fn example(backend: Arc<dyn tolk::TranslationBackend>) -> tolk::Result<()> {
//! let service = TranslationService::builder().backend(backend).build()?;
//!
//! let submitted = service.submit("नमस्ते", "hi", "en")?;
//! if let Some(id) = submitted.task_id() {
//!     loop {
//!         match service.poll(Some(id.as_str()))? {
//!             TaskView::Processing => tokio::time::sleep(std::time::Duration::from_millis(200)).await,
//!             done => { println!("{done:?}"); break; }
//!         }
//!     }
//! }
//! service.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::TranslationServiceBuilder;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::LanguagePairCatalog;
use crate::store::TaskStore;
use crate::telemetry;
use crate::types::{
    LoadedModel, ServiceStatus, SubmitResponse, TaskId, TaskView, TranslationRequest,
};
use crate::worker::Job;
use crate::{Result, TolkError};

/// Asynchronous translation service.
///
/// Explicitly constructed with [`TranslationService::builder`] and explicitly
/// stopped with [`shutdown`](Self::shutdown). Dropping the service also stops
/// the worker once the queue is drained.
pub struct TranslationService {
    jobs: RwLock<Option<mpsc::UnboundedSender<Job>>>,
    store: TaskStore,
    catalog: Arc<LanguagePairCatalog>,
    queue_depth: Arc<AtomicUsize>,
    loaded: watch::Receiver<Vec<LoadedModel>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TranslationService {
    /// Create a builder for configuring the service.
    pub fn builder() -> TranslationServiceBuilder {
        TranslationServiceBuilder::new()
    }

    pub(crate) fn new(
        jobs: mpsc::UnboundedSender<Job>,
        store: TaskStore,
        catalog: Arc<LanguagePairCatalog>,
        queue_depth: Arc<AtomicUsize>,
        loaded: watch::Receiver<Vec<LoadedModel>>,
        worker: JoinHandle<()>,
    ) -> Self {
        Self {
            jobs: RwLock::new(Some(jobs)),
            store,
            catalog,
            queue_depth,
            loaded,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queue a translation and return immediately.
    ///
    /// Empty text short-circuits to `Completed` with an empty translation and
    /// never reaches the queue. Otherwise a fresh task id is registered as
    /// pending and returned. Fails with [`TolkError::ServiceStopped`] after
    /// [`shutdown`](Self::shutdown).
    pub fn submit(
        &self,
        text: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Result<SubmitResponse> {
        let request = TranslationRequest::new(text, source_lang, target_lang);
        if request.text.is_empty() {
            return Ok(SubmitResponse::Completed {
                translation: String::new(),
            });
        }

        // The guarded sender stays valid even if a holder panicked.
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        let sender = jobs.as_ref().ok_or(TolkError::ServiceStopped)?;

        let id = TaskId::generate();
        self.store.put(&id, &request);
        let pair = request.pair.clone();

        self.queue_depth.fetch_add(1, Ordering::SeqCst);
        if sender
            .send(Job {
                id: id.clone(),
                request,
            })
            .is_err()
        {
            self.queue_depth.fetch_sub(1, Ordering::SeqCst);
            self.store.remove(&id);
            warn!(task_id = %id, "worker is gone, rejecting task");
            return Err(TolkError::ServiceStopped);
        }

        metrics::counter!(telemetry::TASKS_SUBMITTED_TOTAL).increment(1);
        metrics::gauge!(telemetry::QUEUE_DEPTH).set(self.queue_depth.load(Ordering::SeqCst) as f64);
        debug!(task_id = %id, %pair, "task queued");
        Ok(SubmitResponse::Processing { task_id: id })
    }

    /// Check on a task.
    ///
    /// Fails with [`TolkError::MissingTaskId`] when no (or an empty) id is
    /// given and with [`TolkError::TaskNotFound`] for ids that never existed
    /// or were already consumed. A terminal result is returned exactly once.
    pub fn poll(&self, task_id: Option<&str>) -> Result<TaskView> {
        let id = match task_id {
            Some(id) if !id.is_empty() => TaskId::from(id),
            _ => return Err(TolkError::MissingTaskId),
        };
        self.store.peek_or_consume(&id)
    }

    /// [`poll`](Self::poll), with errors folded into [`TaskView::Error`].
    ///
    /// This is the shape an HTTP layer returns verbatim.
    pub fn poll_response(&self, task_id: Option<&str>) -> TaskView {
        self.poll(task_id).unwrap_or_else(|e| TaskView::Error {
            message: e.to_string(),
        })
    }

    /// Displayable languages, code → name.
    pub fn languages(&self) -> &BTreeMap<String, String> {
        self.catalog.languages()
    }

    /// The language pair catalog in use.
    pub fn catalog(&self) -> &Arc<LanguagePairCatalog> {
        &self.catalog
    }

    /// Health snapshot.
    pub fn status(&self) -> ServiceStatus {
        let worker_running = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|tx| !tx.is_closed());

        ServiceStatus {
            worker_running,
            queue_depth: self.queue_depth.load(Ordering::SeqCst),
            tracked_tasks: self.store.len(),
            loaded_models: self.loaded.borrow().clone(),
            languages_available: self.catalog.languages().keys().cloned().collect(),
        }
    }

    /// Stop accepting work, let the worker drain the queue, and wait for it to exit.
    ///
    /// Idempotent. Results of drained tasks stay pollable.
    pub async fn shutdown(&self) {
        let sender = self
            .jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);

        if let Some(handle) = self.worker.lock().await.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "translation worker ended abnormally");
            }
            info!("translation service stopped");
        }
    }
}
