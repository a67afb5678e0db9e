//! Concrete translation backends.

#[cfg(feature = "huggingface")]
pub mod huggingface;

#[cfg(feature = "huggingface")]
pub use huggingface::{HuggingFaceBackend, HuggingFaceModel};
