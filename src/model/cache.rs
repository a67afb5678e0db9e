//! Bounded cache of loaded translation models.
//!
//! Keyed by [`LanguagePair`]. Holds at most `capacity` models. What happens on
//! a miss at capacity is decided by [`EvictionPolicy`]:
//!
//! - [`EvictionPolicy::FlushAll`] (default) drops *every* loaded model before
//!   loading the new one. With the default capacity of 1 this is the whole
//!   story: one model in memory at a time.
//! - [`EvictionPolicy::Lru`] drops only the least recently used model.
//!
//! Eviction always runs before the load, so peak memory is bounded by
//! `capacity` models. Evicted models get [`TranslationModel::release`] and are
//! then dropped.
//!
//! The cache is owned by the worker task and never shared, so it needs no
//! locking; `resolve` takes `&mut self` and hands out a borrow of the model
//! that ends before the next job.

use std::fmt;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::traits::{TranslationBackend, TranslationModel};
use crate::telemetry;
use crate::types::{LanguagePair, LoadedModel};
use crate::{Result, TolkError};

/// Default number of models kept loaded at once.
pub const DEFAULT_MODEL_CAPACITY: usize = 1;

/// What to evict when the cache is full and a new model is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Evict every loaded model.
    #[default]
    FlushAll,
    /// Evict the least recently used model only.
    Lru,
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlushAll => f.write_str("flush_all"),
            Self::Lru => f.write_str("lru"),
        }
    }
}

/// Configuration for the model cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCacheConfig {
    /// Maximum number of loaded models. Values below 1 are treated as 1.
    pub capacity: usize,
    /// Eviction policy on a miss at capacity.
    pub policy: EvictionPolicy,
}

impl Default for ModelCacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_MODEL_CAPACITY,
            policy: EvictionPolicy::default(),
        }
    }
}

/// A loaded model and the bookkeeping the cache keeps about it.
struct ModelHandle {
    pair: LanguagePair,
    model_id: String,
    model: Box<dyn TranslationModel>,
    loaded_at: SystemTime,
}

impl ModelHandle {
    fn info(&self) -> LoadedModel {
        LoadedModel {
            pair: self.pair.clone(),
            model_id: self.model_id.clone(),
            loaded_at: self.loaded_at,
        }
    }
}

/// Bounded cache of loaded translation models.
pub struct ModelCache {
    backend: Arc<dyn TranslationBackend>,
    capacity: usize,
    policy: EvictionPolicy,
    /// Ordered least → most recently used.
    entries: Vec<ModelHandle>,
}

impl ModelCache {
    /// Create an empty cache that loads through `backend`.
    pub fn new(backend: Arc<dyn TranslationBackend>, config: ModelCacheConfig) -> Self {
        if config.capacity == 0 {
            warn!("model cache capacity 0 is not usable, using 1");
        }
        Self {
            backend,
            capacity: config.capacity.max(1),
            policy: config.policy,
            entries: Vec::new(),
        }
    }

    /// Get the model for `pair`, loading `model_id` on a miss.
    ///
    /// A miss at capacity evicts according to the policy *before* loading.
    /// Fails with [`TolkError::ModelUnavailable`] if the backend cannot load
    /// the model; the cache is then left without the evicted models.
    pub async fn resolve(
        &mut self,
        pair: &LanguagePair,
        model_id: &str,
    ) -> Result<&dyn TranslationModel> {
        let index = match self.position(pair) {
            Some(pos) => {
                metrics::counter!(telemetry::MODEL_CACHE_HITS_TOTAL).increment(1);
                debug!(%pair, model_id, "model cache hit");
                self.touch(pos)
            }
            None => {
                metrics::counter!(telemetry::MODEL_CACHE_MISSES_TOTAL).increment(1);
                if self.entries.len() >= self.capacity {
                    self.make_room();
                }
                let handle = self.load(pair, model_id).await?;
                self.entries.push(handle);
                self.entries.len() - 1
            }
        };
        Ok(self.entries[index].model.as_ref())
    }

    /// Whether a model for `pair` is currently loaded.
    pub fn contains(&self, pair: &LanguagePair) -> bool {
        self.position(pair).is_some()
    }

    /// Number of loaded models.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no model is loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of loaded models.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Eviction policy in effect.
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Loaded models, least recently used first.
    pub fn loaded(&self) -> Vec<LoadedModel> {
        self.entries.iter().map(ModelHandle::info).collect()
    }

    /// Evict every loaded model.
    pub fn evict_all(&mut self) {
        for handle in std::mem::take(&mut self.entries) {
            Self::evict(handle);
        }
    }

    fn position(&self, pair: &LanguagePair) -> Option<usize> {
        self.entries.iter().position(|h| h.pair == *pair)
    }

    /// Move the entry at `pos` to the most-recently-used end.
    fn touch(&mut self, pos: usize) -> usize {
        let handle = self.entries.remove(pos);
        self.entries.push(handle);
        self.entries.len() - 1
    }

    fn make_room(&mut self) {
        match self.policy {
            EvictionPolicy::FlushAll => self.evict_all(),
            EvictionPolicy::Lru => {
                if !self.entries.is_empty() {
                    let handle = self.entries.remove(0);
                    Self::evict(handle);
                }
            }
        }
    }

    fn evict(handle: ModelHandle) {
        info!(pair = %handle.pair, model_id = %handle.model_id, "evicting model");
        handle.model.release();
        metrics::counter!(telemetry::MODEL_EVICTIONS_TOTAL).increment(1);
    }

    async fn load(&self, pair: &LanguagePair, model_id: &str) -> Result<ModelHandle> {
        info!(%pair, model_id, backend = self.backend.name(), "loading model");
        let started = Instant::now();
        match self.backend.load(model_id).await {
            Ok(model) => {
                let elapsed = started.elapsed();
                metrics::counter!(telemetry::MODEL_LOADS_TOTAL, "status" => "ok").increment(1);
                metrics::histogram!(telemetry::MODEL_LOAD_DURATION_SECONDS)
                    .record(elapsed.as_secs_f64());
                info!(%pair, model_id, elapsed_ms = elapsed.as_millis() as u64, "model loaded");
                Ok(ModelHandle {
                    pair: pair.clone(),
                    model_id: model_id.to_string(),
                    model,
                    loaded_at: SystemTime::now(),
                })
            }
            Err(e) => {
                metrics::counter!(telemetry::MODEL_LOADS_TOTAL, "status" => "error").increment(1);
                warn!(%pair, model_id, error = %e, "model load failed");
                Err(TolkError::ModelUnavailable {
                    model_id: model_id.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

impl Drop for ModelCache {
    fn drop(&mut self) {
        self.evict_all();
    }
}
