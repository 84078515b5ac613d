//! Error types for NexusDesk.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Malformed ticket table: {0}")]
    Malformed(String),

    #[error("Ticket not found: {0}")]
    NotFound(String),

    #[error("Invalid transition for {id}: cannot {action} a ticket that is {status}")]
    InvalidTransition {
        id: String,
        action: &'static str,
        status: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
