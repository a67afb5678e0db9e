//! Builder for configuring service instances

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::info;

use super::TranslationService;
use crate::catalog::LanguagePairCatalog;
use crate::config::Config;
use crate::model::{
    EvictionPolicy, ModelCache, ModelCacheConfig, RetryConfig, RetryingBackend,
    TranslationBackend,
};
use crate::store::TaskStore;
use crate::worker::{Worker, WorkerConfig};
use crate::{Result, TolkError};

/// Builder for [`TranslationService`].
pub struct TranslationServiceBuilder {
    backend: Option<Arc<dyn TranslationBackend>>,
    catalog: Option<LanguagePairCatalog>,
    cache: ModelCacheConfig,
    worker: WorkerConfig,
    retry: RetryConfig,
    task_ttl: Option<Duration>,
}

impl TranslationServiceBuilder {
    pub fn new() -> Self {
        Self {
            backend: None,
            catalog: None,
            cache: ModelCacheConfig::default(),
            worker: WorkerConfig::default(),
            retry: RetryConfig::default(),
            task_ttl: None,
        }
    }

    /// Apply every setting from a loaded [`Config`].
    ///
    /// Settings applied afterwards override the config. Fails if the
    /// config's catalog has malformed pair keys.
    pub fn config(mut self, config: &Config) -> Result<Self> {
        let service = &config.service;
        self.cache.capacity = service.model_capacity;
        self.cache.policy = service.eviction;
        self.worker.max_length = service.max_length;
        self.worker.chunking.threshold_factor = service.chunk_threshold_factor;
        self.worker.chunking.chunk_chars = service.chunk_chars;
        self.worker.error_message_chars = service.error_message_chars;
        self.task_ttl = service.task_ttl_secs.map(Duration::from_secs);
        self.retry = config.retry.to_retry_config();
        if let Some(ref catalog) = config.catalog {
            self.catalog = Some(LanguagePairCatalog::from_config(catalog)?);
        }
        Ok(self)
    }

    /// Set the translation backend (required).
    pub fn backend(mut self, backend: Arc<dyn TranslationBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Replace the default (embedded seed) catalog.
    pub fn catalog(mut self, catalog: LanguagePairCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Maximum number of models loaded at once (default: 1).
    pub fn model_capacity(mut self, capacity: usize) -> Self {
        self.cache.capacity = capacity;
        self
    }

    /// Eviction policy when the model cache is full (default: flush all).
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.cache.policy = policy;
        self
    }

    /// Max sequence length for models that don't report one (default: 512).
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.worker.max_length = max_length;
        self
    }

    /// Chunk inputs longer than `factor × max_length` characters (default: 2).
    pub fn chunk_threshold_factor(mut self, factor: usize) -> Self {
        self.worker.chunking.threshold_factor = factor;
        self
    }

    /// Characters per chunk (default: the effective max length).
    pub fn chunk_chars(mut self, chars: usize) -> Self {
        self.worker.chunking.chunk_chars = Some(chars);
        self
    }

    /// Cap on stored error text for failed tasks (default: 200 chars).
    pub fn error_message_chars(mut self, chars: usize) -> Self {
        self.worker.error_message_chars = chars;
        self
    }

    /// Retry policy for model loads (default: 3 attempts, 500ms base delay).
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Expire unpolled results this long after the task finished.
    ///
    /// Off by default: unpolled tasks are kept until the process exits.
    /// Queued and running tasks never expire.
    pub fn task_ttl(mut self, ttl: Duration) -> Self {
        self.task_ttl = Some(ttl);
        self
    }

    /// Build the service and spawn its worker on the current tokio runtime.
    pub fn build(self) -> Result<TranslationService> {
        let backend = self.backend.ok_or_else(|| {
            TolkError::Configuration("no translation backend configured".to_string())
        })?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            TolkError::Configuration(format!("translation service needs a tokio runtime: {e}"))
        })?;

        let backend: Arc<dyn TranslationBackend> = if self.retry.max_attempts > 1 {
            Arc::new(RetryingBackend::new(backend, self.retry))
        } else {
            backend
        };

        let catalog = Arc::new(
            self.catalog
                .unwrap_or_else(LanguagePairCatalog::with_embedded_seed),
        );
        let store = match self.task_ttl {
            Some(ttl) => TaskStore::with_ttl(ttl),
            None => TaskStore::new(),
        };
        let queue_depth = Arc::new(AtomicUsize::new(0));
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let (loaded_tx, loaded_rx) = watch::channel(Vec::new());

        info!(
            backend = backend.name(),
            pairs = catalog.len(),
            capacity = self.cache.capacity,
            policy = %self.cache.policy,
            "starting translation service"
        );

        let cache = ModelCache::new(backend, self.cache);
        let worker = Worker::new(
            job_rx,
            cache,
            Arc::clone(&catalog),
            store.clone(),
            self.worker,
            Arc::clone(&queue_depth),
            loaded_tx,
        );
        let handle = runtime.spawn(worker.run());

        Ok(TranslationService::new(
            job_tx,
            store,
            catalog,
            queue_depth,
            loaded_rx,
            handle,
        ))
    }
}

impl Default for TranslationServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
