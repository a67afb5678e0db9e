//! Language pair catalog: which model translates which pair.
//!
//! The catalog maps a (source, target) [`LanguagePair`] to a backend model
//! identifier and carries the table of displayable languages (code → name).
//! It is built once and then shared read-only (`Arc<LanguagePairCatalog>`)
//! between the service facade and the worker.
//!
//! The default catalog is the compiled-in seed: Helsinki-NLP opus-mt models
//! for English paired with French, Spanish, German and Hindi. Deployments
//! replace it wholesale through the `[catalog]` config section.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{LanguagePair, Result};

/// Serializable catalog description, as found in `seed.json` and in the
/// `[catalog]` config section.
///
/// Pair keys use `source-target` form (`"hi-en"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Language code → display name.
    #[serde(default)]
    pub languages: BTreeMap<String, String>,
    /// `source-target` → model id.
    #[serde(default)]
    pub pairs: BTreeMap<String, String>,
}

/// Static mapping from language pair to model identifier.
#[derive(Debug, Clone, Default)]
pub struct LanguagePairCatalog {
    languages: BTreeMap<String, String>,
    pairs: HashMap<LanguagePair, String>,
}

impl LanguagePairCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog pre-populated with the embedded seed data.
    pub fn with_embedded_seed() -> Self {
        let parsed = serde_json::from_str::<CatalogConfig>(EMBEDDED_SEED)
            .map_err(crate::TolkError::from)
            .and_then(|seed| Self::from_config(&seed));
        match parsed {
            Ok(catalog) => catalog,
            Err(e) => {
                // Seed is compiled in and covered by tests; an empty catalog
                // still answers every request with "not available".
                warn!(error = %e, "failed to parse embedded catalog seed");
                Self::new()
            }
        }
    }

    /// Build a catalog from its serializable description.
    ///
    /// Fails with `InvalidInput` if a pair key is not in `source-target` form.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let mut catalog = Self::new();
        for (code, name) in &config.languages {
            catalog = catalog.with_language(code, name);
        }
        for (key, model_id) in &config.pairs {
            let pair: LanguagePair = key.parse()?;
            catalog.pairs.insert(pair, model_id.clone());
        }
        Ok(catalog)
    }

    /// Add (or rename) a displayable language.
    pub fn with_language(mut self, code: impl Into<String>, name: impl Into<String>) -> Self {
        self.languages.insert(code.into(), name.into());
        self
    }

    /// Map a pair to a model id, replacing any previous mapping.
    pub fn with_pair(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        self.pairs
            .insert(LanguagePair::new(source, target), model_id.into());
        self
    }

    /// Model id for a pair, or `None` if the pair is unsupported.
    pub fn lookup(&self, pair: &LanguagePair) -> Option<&str> {
        self.pairs.get(pair).map(String::as_str)
    }

    /// Whether the catalog has a model for this pair.
    pub fn supports(&self, pair: &LanguagePair) -> bool {
        self.pairs.contains_key(pair)
    }

    /// Displayable languages, ordered by code.
    pub fn languages(&self) -> &BTreeMap<String, String> {
        &self.languages
    }

    /// All supported pairs with their model ids, ordered by pair.
    pub fn pairs(&self) -> Vec<(&LanguagePair, &str)> {
        let mut pairs: Vec<_> = self
            .pairs
            .iter()
            .map(|(pair, model)| (pair, model.as_str()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs
    }

    /// Number of supported pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no pair is supported.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Raw JSON seed data compiled into the binary.
const EMBEDDED_SEED: &str = include_str!("seed.json");
