//! Public types for the Tolk API.

mod language;
mod request;
mod status;
mod task;

pub use language::LanguagePair;
pub use request::TranslationRequest;
pub use status::{LoadedModel, ServiceStatus};
pub use task::{SubmitResponse, TaskId, TaskStatus, TaskView};
