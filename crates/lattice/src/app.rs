//! Application context for CLI and server execution.
//!
//! [`App`] locates the workspace, loads its configuration, opens the store,
//! and assembles the [`RelationGraph`] that both front ends drive.
//!
//! # Example
//!
//! ```no_run
//! use lattice::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     let report = app.graph().audit().await?;
//!     println!("{} issues", report.issues_scanned);
//!     Ok(())
//! }
//! ```

use crate::access::MembershipGuard;
use crate::config::{CONFIG_FILE_NAME, LATTICE_DIR_NAME, LatticeConfig, find_lattice_root};
use crate::error::{Error, Result};
use crate::graph::RelationGraph;
use crate::storage::create_store;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Application context.
#[derive(Debug)]
pub struct App {
    graph: Arc<RelationGraph>,

    /// Path to the workspace root (the directory containing `.lattice`)
    root_dir: PathBuf,

    config: LatticeConfig,
}

impl App {
    /// Create an App from the given working directory.
    ///
    /// Searches up the directory tree for `.lattice/`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No workspace is found in the directory tree
    /// - Configuration cannot be loaded
    /// - Storage initialization fails
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_lattice_root(working_dir).ok_or_else(|| {
            Error::Config(format!(
                "Not a lattice repository (or any parent up to the filesystem root). Run 'lattice init' to create '{LATTICE_DIR_NAME}'"
            ))
        })?;
        let config_path = root_dir.join(LATTICE_DIR_NAME).join(CONFIG_FILE_NAME);
        let config = LatticeConfig::load(&config_path).await?;
        Self::from_config(root_dir, config).await
    }

    /// Create an App from an explicit configuration file.
    ///
    /// Relative data paths resolve against the directory holding `.lattice`,
    /// or against the file's own directory when it lives elsewhere.
    pub async fn from_config_file(config_path: &Path) -> Result<Self> {
        let config = LatticeConfig::load(config_path).await?;
        let parent = config_path.parent().unwrap_or(Path::new("."));
        let root_dir = if parent.ends_with(LATTICE_DIR_NAME) {
            parent.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            parent.to_path_buf()
        };
        Self::from_config(root_dir, config).await
    }

    async fn from_config(root_dir: PathBuf, config: LatticeConfig) -> Result<Self> {
        let backend = config.storage.to_backend(&root_dir)?;
        let store = create_store(backend, config.storage.timeout()).await?;
        let guard = Arc::new(MembershipGuard::new(config.memberships.clone()));
        tracing::debug!(
            root = %root_dir.display(),
            backend = %config.storage.backend,
            projects = config.memberships.len(),
            "Opened workspace"
        );
        Ok(Self {
            graph: Arc::new(RelationGraph::new(store, guard)),
            root_dir,
            config,
        })
    }

    /// The shared graph service.
    pub fn graph(&self) -> &Arc<RelationGraph> {
        &self.graph
    }

    /// The loaded configuration.
    pub fn config(&self) -> &LatticeConfig {
        &self.config
    }

    /// Get the issue ID prefix.
    pub fn prefix(&self) -> &str {
        &self.config.issue_prefix
    }

    /// Get the workspace root directory.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }
}
