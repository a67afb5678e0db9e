//! Language pair keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TolkError;

/// A (source, target) language pair, e.g. `hi` → `en`.
///
/// Used as the catalog key and as the model cache key. Rendered and parsed
/// in `source-target` form (`"hi-en"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LanguagePair {
    /// Source language code.
    pub source: String,
    /// Target language code.
    pub target: String,
}

impl LanguagePair {
    /// Create a pair from source and target codes.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

impl FromStr for LanguagePair {
    type Err = TolkError;

    /// Parse `source-target`. Splits on the first `-`, so codes themselves
    /// must not contain one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((source, target)) if !source.is_empty() && !target.is_empty() => {
                Ok(Self::new(source.trim(), target.trim()))
            }
            _ => Err(TolkError::InvalidInput(format!(
                "language pair must look like 'en-fr', got '{s}'"
            ))),
        }
    }
}
