//! Service health snapshot types.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::LanguagePair;

/// A model currently held by the model cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedModel {
    /// Pair the model was loaded for.
    pub pair: LanguagePair,
    /// Backend model identifier (e.g. "Helsinki-NLP/opus-mt-hi-en").
    pub model_id: String,
    /// When the load finished.
    pub loaded_at: SystemTime,
}

/// Point-in-time view of the translation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// Whether the background worker is still accepting work.
    pub worker_running: bool,
    /// Jobs queued but not yet picked up.
    pub queue_depth: usize,
    /// Tasks held in the store (pending or unpolled results).
    pub tracked_tasks: u64,
    /// Models currently loaded.
    pub loaded_models: Vec<LoadedModel>,
    /// Language codes known to the catalog.
    pub languages_available: Vec<String>,
}
