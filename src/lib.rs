//! Tolk - asynchronous machine translation task service
//!
//! Tolk accepts text plus a source/target language pair, hands back a task
//! id immediately, and translates in the background on a single worker that
//! loads translation models on demand into a small bounded cache.
//!
//! The pieces, leaves first:
//!
//! - [`LanguagePairCatalog`]: which model translates which pair
//! - [`ModelCache`]: loaded models, at most N, evicted to respect memory
//! - [`TaskStore`]: task id → state, each result readable once
//! - the worker: FIFO consumer that resolves models, translates (chunking
//!   long inputs) and records outcomes
//! - [`TranslationService`]: the facade, `submit` and `poll`
//!
//! The translation capability itself is a pair of traits,
//! [`TranslationBackend`] and [`TranslationModel`]. A HuggingFace Inference
//! API implementation ships behind the `huggingface` feature.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tolk::{TaskView, TranslationService};
//! use tolk::backends::HuggingFaceBackend;
//!
//! #[tokio::main]
//! async fn main() -> tolk::Result<()> {
//!     let backend = Arc::new(HuggingFaceBackend::new(std::env::var("HF_API_KEY").ok())?);
//!     let service = TranslationService::builder().backend(backend).build()?;
//!
//!     let submitted = service.submit("Bonjour le monde", "fr", "en")?;
//!     let id = submitted.task_id().cloned();
//!     loop {
//!         match service.poll_response(id.as_ref().map(|id| id.as_str())) {
//!             TaskView::Processing => tokio::time::sleep(std::time::Duration::from_millis(250)).await,
//!             other => {
//!                 println!("{}", serde_json::to_string(&other)?);
//!                 break;
//!             }
//!         }
//!     }
//!
//!     service.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod backends;
pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod types;
mod version;
pub mod worker;

// Re-export main types at crate root
pub use catalog::{CatalogConfig, LanguagePairCatalog};
pub use config::Config;
pub use error::{Result, TolkError};
pub use model::{
    EvictionPolicy, ModelCache, ModelCacheConfig, RetryConfig, RetryingBackend,
    TranslationBackend, TranslationModel,
};
pub use service::{TranslationService, TranslationServiceBuilder};
pub use store::TaskStore;
pub use version::{GIT_BRANCH, GIT_SHA, PKG_VERSION, git_dirty, version_string};
pub use worker::{ChunkingConfig, WorkerConfig};

// Re-export all types
pub use types::{
    LanguagePair, LoadedModel, ServiceStatus, SubmitResponse, TaskId, TaskStatus, TaskView,
    TranslationRequest,
};
