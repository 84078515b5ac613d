//! Failures of the remote classifier. Every variant is recoverable by the
//! keyword fallback.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("No API key configured")]
    MissingCredential,

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Response is not JSON: {0}")]
    Parse(String),

    #[error("Response is missing or has invalid fields: {0}")]
    Validation(String),
}

impl From<reqwest::Error> for ClassifyError {
    fn from(e: reqwest::Error) -> Self {
        ClassifyError::Transport(e.to_string())
    }
}
