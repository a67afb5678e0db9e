//! Fixed-size character chunking for long inputs.
//!
//! Inputs longer than `threshold_factor × max_length` characters are cut into
//! chunks of `chunk_chars` characters and translated one by one. Character
//! count stands in for token count. Cuts are not sentence-aware and may fall
//! mid-sentence or mid-word; they never fall inside a UTF-8 sequence.

use crate::Result;
use crate::model::TranslationModel;
use crate::telemetry;

/// Default multiple of `max_length` above which input is chunked.
pub const DEFAULT_CHUNK_THRESHOLD_FACTOR: usize = 2;

/// Chunking parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Chunk when `chars > threshold_factor * max_length`.
    pub threshold_factor: usize,
    /// Characters per chunk. `None` uses the effective `max_length`.
    pub chunk_chars: Option<usize>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            threshold_factor: DEFAULT_CHUNK_THRESHOLD_FACTOR,
            chunk_chars: None,
        }
    }
}

impl ChunkingConfig {
    /// Whether `text` must be chunked for a model with `max_length`.
    pub fn needs_chunking(&self, text: &str, max_length: usize) -> bool {
        text.chars().count() > self.threshold_factor.saturating_mul(max_length)
    }

    /// Chunk size to use for a model with `max_length`.
    pub fn chunk_size(&self, max_length: usize) -> usize {
        self.chunk_chars.unwrap_or(max_length).max(1)
    }
}

/// Split `text` into consecutive pieces of at most `chunk_chars` characters.
///
/// Concatenating the pieces yields `text` again.
pub fn split_chunks(text: &str, chunk_chars: usize) -> Vec<&str> {
    let size = chunk_chars.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    for (count, (idx, _)) in text.char_indices().enumerate() {
        if count > 0 && count % size == 0 {
            chunks.push(&text[start..idx]);
            start = idx;
        }
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// Translate `text`, chunking it first if it is over the threshold.
///
/// Chunk translations are joined with a single space, in input order.
pub async fn translate_text(
    model: &dyn TranslationModel,
    text: &str,
    max_length: usize,
    config: &ChunkingConfig,
) -> Result<String> {
    if !config.needs_chunking(text, max_length) {
        return model.translate(text, max_length).await;
    }

    let chunks = split_chunks(text, config.chunk_size(max_length));
    tracing::debug!(
        model_id = model.model_id(),
        chunks = chunks.len(),
        "translating in chunks"
    );
    metrics::counter!(telemetry::TRANSLATION_CHUNKS_TOTAL).increment(chunks.len() as u64);

    let mut translated = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        translated.push(model.translate(chunk, max_length).await?);
    }
    Ok(translated.join(" "))
}
