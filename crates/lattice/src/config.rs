//! Workspace configuration.
//!
//! A lattice workspace is a directory containing `.lattice/config.yaml`.
//! Every field except `issue-prefix` and `storage` has a default, so a
//! minimal file is:
//!
//! ```yaml
//! issue-prefix: proj
//! storage:
//!   backend: jsonl
//!   data_file: .lattice/issues.jsonl
//! ```

use crate::access::{Memberships, Role};
use crate::error::{Error, Result};
use crate::storage::StoreBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Default issue prefix if none specified
pub const DEFAULT_PREFIX: &str = "proj";

/// Name of the lattice directory
pub const LATTICE_DIR_NAME: &str = ".lattice";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the issues data file
pub const ISSUES_FILE_NAME: &str = "issues.jsonl";

/// Default per-call store timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default HTTP bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Maximum directory depth to traverse when searching for the workspace root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LatticeConfig {
    /// Project id used for issues created without an explicit project
    #[serde(rename = "issue-prefix")]
    pub issue_prefix: String,

    /// Storage configuration
    pub storage: StorageConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Project -> actor -> role
    #[serde(default)]
    pub memberships: Memberships,
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Storage backend type: `memory` or `jsonl`
    pub backend: String,

    /// Path to the data file, relative to the workspace root
    pub data_file: String,

    /// Per-call store timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// HTTP server configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl StorageConfig {
    /// Resolve the configured backend against the workspace root.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an unknown backend name.
    pub fn to_backend(&self, root_dir: &Path) -> Result<StoreBackend> {
        match self.backend.as_str() {
            "memory" => Ok(StoreBackend::InMemory),
            "jsonl" => Ok(StoreBackend::Jsonl(root_dir.join(&self.data_file))),
            other => Err(Error::Config(format!(
                "Unknown storage backend '{other}' (expected 'memory' or 'jsonl')"
            ))),
        }
    }

    /// Per-call store timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl LatticeConfig {
    /// Create a new configuration with the given prefix
    pub fn new(prefix: &str) -> Self {
        Self {
            issue_prefix: prefix.to_string(),
            storage: StorageConfig {
                backend: "jsonl".to_string(),
                data_file: format!("{LATTICE_DIR_NAME}/{ISSUES_FILE_NAME}"),
                timeout_ms: DEFAULT_TIMEOUT_MS,
            },
            server: ServerConfig::default(),
            memberships: Memberships::new(),
        }
    }

    /// Give `actor` `role` in `project`, replacing any previous role.
    pub fn grant(&mut self, project: &str, actor: &str, role: Role) {
        self.memberships
            .entry(project.to_string())
            .or_default()
            .insert(actor.to_string(), role);
    }

    /// Load configuration from a file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save configuration to a file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

/// Find the workspace root by searching up the directory tree.
///
/// Returns the directory containing `.lattice/`, or `None` if there is none
/// within [`MAX_TRAVERSAL_DEPTH`] levels.
pub fn find_lattice_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(LATTICE_DIR_NAME).exists() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}
