//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `init`: Initialize a new workspace
//! - `create`: Create a new issue
//! - `show`: Show an issue and its relations
//! - `link` / `unlink`: Add or remove a relation on both endpoints
//! - `delete`: Delete an issue and scrub it from its neighbours
//! - `audit`: Report relations whose mirror is missing
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//! - `--actor`: Who is acting (defaults to `$LATTICE_ACTOR`, then `$USER`)
//!
//! # Example
//!
//! ```bash
//! lattice init --prefix proj
//! lattice create --title "Fix login" --type bug
//! lattice link proj-a3f8 blocks proj-9kq2
//! lattice link proj-9kq2 parent proj-epic
//! lattice delete proj-a3f8
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::domain::Actor;

pub use args::{AuditArgs, CreateArgs, DeleteArgs, InitArgs, RelationArgs, ShowArgs};
pub use types::{IssueTypeArg, RelationKindArg};
pub use validators::{validate_issue_id, validate_prefix, validate_title};

/// Environment variable consulted when `--actor` is not given
pub const ACTOR_ENV: &str = "LATTICE_ACTOR";

/// Lattice - typed, mirrored relations between issues
///
/// Every relation is stored on both endpoints. Deleting an issue removes it
/// from every neighbour first.
#[derive(Parser, Debug)]
#[command(name = "lattice")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Name of the acting user, checked against project memberships
    #[arg(long, global = true)]
    pub actor: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new lattice workspace
    ///
    /// Creates `.lattice/` with a configuration file and an empty issue file,
    /// and registers the acting user as owner of the prefix project.
    Init(InitArgs),

    /// Create a new issue
    Create(CreateArgs),

    /// Show an issue and its relations
    Show(ShowArgs),

    /// Add a relation, mirrored onto the target
    ///
    /// Setting a parent moves the issue out of its previous parent's children.
    Link(RelationArgs),

    /// Remove a relation from both endpoints
    Unlink(RelationArgs),

    /// Delete an issue permanently
    ///
    /// The issue is first removed from every issue it is related to.
    Delete(DeleteArgs),

    /// Check that every relation has its mirror
    ///
    /// Exits with an error when problems are found.
    Audit(AuditArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// The acting user: `--actor`, then `$LATTICE_ACTOR`, then `$USER`.
    pub fn resolve_actor(&self) -> Actor {
        self.actor
            .clone()
            .or_else(|| std::env::var(ACTOR_ENV).ok())
            .or_else(|| std::env::var("USER").ok())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .map_or_else(Actor::anonymous, Actor::new)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };
        let actor = self.resolve_actor();

        let Some(command) = &self.command else {
            println!("Lattice issue relationship graph");
            println!("Use --help for more information");
            return Ok(());
        };

        if let Commands::Init(args) = command {
            return execute::execute_init(args, &actor).await;
        }

        let app = App::from_directory(&std::env::current_dir()?).await?;
        tracing::debug!(%actor, "Executing command");
        match command {
            Commands::Init(_) => Ok(()),
            Commands::Create(args) => execute::execute_create(&app, args, &actor, output_mode).await,
            Commands::Show(args) => execute::execute_show(&app, args, output_mode).await,
            Commands::Link(args) => execute::execute_link(&app, args, &actor, output_mode).await,
            Commands::Unlink(args) => {
                execute::execute_unlink(&app, args, &actor, output_mode).await
            }
            Commands::Delete(args) => {
                execute::execute_delete(&app, args, &actor, output_mode).await
            }
            Commands::Audit(args) => execute::execute_audit(&app, args, output_mode).await,
        }
    }
}
