//! The translation worker: a single consumer draining the job queue.
//!
//! One worker task per service, one unbounded FIFO queue. Jobs are processed
//! strictly in submission order across all language pairs, which also means a
//! slow model load stalls every job behind it. There is no cancellation and
//! no timeout.
//!
//! The loop never dies because of a job. Errors become `Failed` tasks with a
//! truncated description; a panic while processing a job is caught, logged,
//! and turns into a `Failed` task reading "server error".

pub mod chunk;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use futures_util::FutureExt;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

pub use chunk::{ChunkingConfig, DEFAULT_CHUNK_THRESHOLD_FACTOR, split_chunks, translate_text};

use crate::catalog::LanguagePairCatalog;
use crate::model::ModelCache;
use crate::store::TaskStore;
use crate::telemetry;
use crate::types::{LoadedModel, TaskId, TranslationRequest};
use crate::{Result, TolkError};

/// Default maximum sequence length passed to models that don't report one.
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// Default cap on the length of error text stored for failed tasks.
pub const DEFAULT_ERROR_MESSAGE_CHARS: usize = 200;

/// Worker tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Max sequence length for models that don't report their own.
    pub max_length: usize,
    /// Long-input chunking.
    pub chunking: ChunkingConfig,
    /// Failed-task error text is cut to this many characters.
    pub error_message_chars: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            chunking: ChunkingConfig::default(),
            error_message_chars: DEFAULT_ERROR_MESSAGE_CHARS,
        }
    }
}

/// A queued unit of work.
#[derive(Debug)]
pub(crate) struct Job {
    pub(crate) id: TaskId,
    pub(crate) request: TranslationRequest,
}

/// Everything the worker task owns.
pub(crate) struct Worker {
    jobs: mpsc::UnboundedReceiver<Job>,
    cache: ModelCache,
    catalog: Arc<LanguagePairCatalog>,
    store: TaskStore,
    config: WorkerConfig,
    queue_depth: Arc<AtomicUsize>,
    loaded: watch::Sender<Vec<LoadedModel>>,
}

impl Worker {
    pub(crate) fn new(
        jobs: mpsc::UnboundedReceiver<Job>,
        cache: ModelCache,
        catalog: Arc<LanguagePairCatalog>,
        store: TaskStore,
        config: WorkerConfig,
        queue_depth: Arc<AtomicUsize>,
        loaded: watch::Sender<Vec<LoadedModel>>,
    ) -> Self {
        Self {
            jobs,
            cache,
            catalog,
            store,
            config,
            queue_depth,
            loaded,
        }
    }

    /// Consume jobs until every sender is gone and the queue is drained.
    pub(crate) async fn run(mut self) {
        info!(
            capacity = self.cache.capacity(),
            policy = %self.cache.policy(),
            max_length = self.config.max_length,
            "translation worker started"
        );

        while let Some(job) = self.jobs.recv().await {
            let depth = self.queue_depth.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
            metrics::gauge!(telemetry::QUEUE_DEPTH).set(depth as f64);

            let id = job.id.clone();
            let outcome = AssertUnwindSafe(self.process(job)).catch_unwind().await;
            if let Err(panic) = outcome {
                let failure = TolkError::WorkerLoop(panic_message(panic.as_ref()));
                error!(task_id = %id, error = ?failure, "worker loop failure");
                self.record_failure(&id, &failure);
            }

            self.loaded.send_replace(self.cache.loaded());
        }

        self.cache.evict_all();
        self.loaded.send_replace(Vec::new());
        info!("translation worker stopped");
    }

    /// Run one job to its terminal state.
    async fn process(&mut self, job: Job) {
        let Job { id, request } = job;
        self.store.mark_translating(&id);
        debug!(
            task_id = %id,
            pair = %request.pair,
            chars = request.text.chars().count(),
            "translating"
        );

        let started = Instant::now();
        let result = self.translate(&request).await;
        metrics::histogram!(telemetry::TRANSLATION_DURATION_SECONDS, "pair" => request.pair.to_string())
            .record(started.elapsed().as_secs_f64());

        match result {
            Ok(translation) => {
                metrics::counter!(telemetry::TASKS_FINISHED_TOTAL, "status" => "completed")
                    .increment(1);
                self.store.complete(&id, translation);
            }
            Err(e) => {
                warn!(task_id = %id, pair = %request.pair, error = %e, "translation failed");
                self.record_failure(&id, &e);
            }
        }
    }

    /// Translate one request.
    ///
    /// An unsupported pair is not an error: the explanatory text is the result.
    async fn translate(&mut self, request: &TranslationRequest) -> Result<String> {
        let Some(model_id) = self.catalog.lookup(&request.pair) else {
            let unsupported = TolkError::UnsupportedLanguagePair {
                from: request.source_lang().to_string(),
                to: request.target_lang().to_string(),
            };
            debug!(pair = %request.pair, "no model for pair");
            return Ok(unsupported.to_string());
        };

        let model = self.cache.resolve(&request.pair, model_id).await?;
        let max_length = model.max_length().unwrap_or(self.config.max_length);
        translate_text(model, &request.text, max_length, &self.config.chunking).await
    }

    fn record_failure(&self, id: &TaskId, error: &TolkError) {
        metrics::counter!(telemetry::TASKS_FINISHED_TOTAL, "status" => "failed").increment(1);
        let message = truncate_chars(&error.to_string(), self.config.error_message_chars);
        self.store.fail(id, message);
    }
}

/// Cut `text` to at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
