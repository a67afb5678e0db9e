//! Translation requests.

use serde::{Deserialize, Serialize};

use super::LanguagePair;

/// Text to translate plus the language pair to translate it with.
///
/// Immutable once enqueued: the worker receives it by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// Input text.
    pub text: String,
    /// Source and target languages.
    pub pair: LanguagePair,
}

impl TranslationRequest {
    /// Create a request.
    pub fn new(
        text: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            pair: LanguagePair::new(source_lang, target_lang),
        }
    }

    /// Source language code.
    pub fn source_lang(&self) -> &str {
        &self.pair.source
    }

    /// Target language code.
    pub fn target_lang(&self) -> &str {
        &self.pair.target
    }
}
