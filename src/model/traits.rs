//! The translation capability seam.
//!
//! The task system treats models as opaque: a [`TranslationBackend`] knows
//! how to turn a model id into a loaded [`TranslationModel`], and a loaded
//! model turns text into translated text. Both may be slow and both may fail.
//!
//! Loaded models are owned by [`ModelCache`](super::ModelCache); nothing else
//! keeps a handle past a single translation.

use async_trait::async_trait;

use crate::Result;

/// A loaded translation model.
#[async_trait]
pub trait TranslationModel: Send + Sync {
    /// Model identifier this instance was loaded from.
    fn model_id(&self) -> &str;

    /// Maximum input length (in tokens) the model accepts, if it knows it.
    ///
    /// When `None`, the worker's configured `max_length` is used.
    fn max_length(&self) -> Option<usize> {
        None
    }

    /// Translate `text`, truncating the input to `max_length` tokens.
    async fn translate(&self, text: &str, max_length: usize) -> Result<String>;

    /// Best-effort release of host-level resources (device memory, scratch
    /// buffers) before the model is dropped. Called once, on eviction.
    fn release(&self) {}
}

/// Loads translation models by id.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Backend name for logging and metrics (e.g. "huggingface").
    fn name(&self) -> &str;

    /// Load (download, deserialize, warm up) the model identified by `model_id`.
    ///
    /// May block for seconds to minutes on first use of a model.
    async fn load(&self, model_id: &str) -> Result<Box<dyn TranslationModel>>;
}
