//! Complaint classification.
//!
//! A remote LLM turns free text into a [`Diagnosis`]; when no credential is
//! configured or the call fails, the deterministic keyword table in
//! [`fallback`] produces one instead.

pub mod config;
pub mod error;
pub mod fallback;
pub mod parse;
pub mod prompt;
pub mod providers;
pub mod types;

pub use config::ClassifierConfig;
pub use error::ClassifyError;
pub use types::*;
