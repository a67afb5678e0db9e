//! Translation models: the capability traits, load retry, and the model cache.

pub mod cache;
pub mod retry;
pub mod traits;

pub use cache::{DEFAULT_MODEL_CAPACITY, EvictionPolicy, ModelCache, ModelCacheConfig};
pub use retry::{RetryConfig, RetryingBackend};
pub use traits::{TranslationBackend, TranslationModel};
