//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths to all ChatGate data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// LLM credential configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
    /// Persisted browser session blob (`data/browser-session.json`).
    pub browser_session_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates the root if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            llm_config_file: root.join("llm-config.json"),
            browser_session_file: root.join("browser-session.json"),
            root,
        })
    }
}

/// Top-level ChatGate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatGateConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
}

impl ChatGateConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3009);

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self { port, data_paths })
    }
}
