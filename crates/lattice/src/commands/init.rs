//! Implementation of the `init` command.
//!
//! Creates the `.lattice/` directory with a configuration file and an empty
//! issues file.

use crate::access::Role;
use crate::config::{
    CONFIG_FILE_NAME, DEFAULT_PREFIX, ISSUES_FILE_NAME, LATTICE_DIR_NAME, LatticeConfig,
};
use crate::domain::{MAX_PROJECT_LENGTH, MIN_PROJECT_LENGTH};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the gitignore file within .lattice
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created lattice directory
    pub lattice_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created issues file
    pub issues_file: PathBuf,
    /// The prefix used for issue IDs
    pub prefix: String,
    /// Actor registered as project owner, if any
    pub owner: Option<String>,
}

/// Validate issue ID prefix format.
///
/// Requirements:
/// - 2-20 characters
/// - Alphanumeric only (letters and digits)
///
/// Note: Expects pre-trimmed input. Callers should trim whitespace before calling.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.len() < MIN_PROJECT_LENGTH {
        return Err(Error::Config(format!(
            "Prefix must be at least {MIN_PROJECT_LENGTH} characters"
        )));
    }

    if prefix.len() > MAX_PROJECT_LENGTH {
        return Err(Error::Config(format!(
            "Prefix cannot exceed {MAX_PROJECT_LENGTH} characters"
        )));
    }

    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::Config(
            "Prefix must contain only alphanumeric characters".to_string(),
        ));
    }

    Ok(())
}

/// Initialize a new lattice workspace in `base_dir`.
///
/// When `owner` is given, that actor becomes owner of the prefix project so
/// the workspace is usable right away.
///
/// # Errors
///
/// Returns an error if:
/// - The `.lattice/` directory already exists
/// - The prefix is invalid
/// - File system operations fail
pub async fn init(base_dir: &Path, prefix: Option<&str>, owner: Option<&str>) -> Result<InitResult> {
    let prefix = prefix.unwrap_or(DEFAULT_PREFIX).trim();
    validate_prefix(prefix)?;

    let lattice_dir = base_dir.join(LATTICE_DIR_NAME);
    if lattice_dir.exists() {
        return Err(Error::Config(format!(
            "Lattice is already initialized in this directory. Found existing '{LATTICE_DIR_NAME}'"
        )));
    }

    fs::create_dir_all(&lattice_dir).await?;

    let mut config = LatticeConfig::new(prefix);
    let owner = owner.map(str::trim).filter(|name| !name.is_empty());
    if let Some(owner) = owner {
        config.grant(prefix, owner, Role::Owner);
    }
    let config_file = lattice_dir.join(CONFIG_FILE_NAME);
    config.save(&config_file).await?;

    let issues_file = lattice_dir.join(ISSUES_FILE_NAME);
    fs::write(&issues_file, "").await?;

    fs::write(
        lattice_dir.join(GITIGNORE_FILE_NAME),
        "# Temp files left by interrupted writes\n*.tmp\n",
    )
    .await?;

    tracing::info!(path = %lattice_dir.display(), prefix, ?owner, "Initialized workspace");

    Ok(InitResult {
        lattice_dir,
        config_file,
        issues_file,
        prefix: prefix.to_string(),
        owner: owner.map(str::to_string),
    })
}
