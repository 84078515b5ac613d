//! NexusDesk Core: error taxonomy and configuration shared by every crate.

pub mod config;
pub mod error;

pub use config::{DataPaths, NexusConfig};
pub use error::{Error, Result};
