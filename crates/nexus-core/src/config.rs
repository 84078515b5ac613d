//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8501;

/// Default timeout for one remote classification call.
pub const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 30;

/// Paths to all NexusDesk data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Ticket table (`data/ticket_db.csv`).
    pub tickets_file: PathBuf,
    /// Classifier provider configuration (`data/classifier-config.json`).
    pub classifier_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            tickets_file: root.join("ticket_db.csv"),
            classifier_config_file: root.join("classifier-config.json"),
            root,
        };
        std::fs::create_dir_all(&paths.root)?;
        Ok(paths)
    }
}

/// Top-level NexusDesk configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NexusConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Upper bound on a single remote classifier round trip, in seconds.
    pub classifier_timeout_secs: u64,
}

impl NexusConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let classifier_timeout_secs = std::env::var("NEXUS_LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CLASSIFIER_TIMEOUT_SECS);

        let mut data_paths = DataPaths::new(data_dir)?;
        if let Ok(file) = std::env::var("NEXUS_TICKETS_FILE") {
            data_paths.tickets_file = PathBuf::from(file);
        }
        debug!(
            "Ticket table at {}, classifier timeout {}s",
            data_paths.tickets_file.display(),
            classifier_timeout_secs
        );

        Ok(Self {
            port,
            data_paths,
            classifier_timeout_secs,
        })
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_secs(self.classifier_timeout_secs)
    }
}
