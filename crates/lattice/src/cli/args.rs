//! CLI argument structs for all commands.

use clap::Parser;

use super::types::{IssueTypeArg, RelationKindArg};
use super::validators::{validate_issue_id, validate_prefix, validate_title};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Issue ID prefix (e.g., "proj" for "proj-abc")
    ///
    /// Must be 2-20 alphanumeric characters. It is also the project the
    /// acting user is made owner of.
    #[arg(short, long, value_parser = validate_prefix)]
    pub prefix: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `create` command
#[derive(Parser, Debug, Clone)]
pub struct CreateArgs {
    /// Issue title (maximum 200 characters)
    #[arg(long, value_parser = validate_title)]
    pub title: String,

    /// Detailed description
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// Issue type
    #[arg(short = 't', long = "type", value_enum, default_value = "task")]
    pub issue_type: IssueTypeArg,

    /// Project to create the issue in (defaults to the configured prefix)
    #[arg(short, long, value_parser = validate_prefix)]
    pub project: Option<String>,
}

/// Arguments for the `show` command
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// Issue ID to display
    #[arg(value_parser = validate_issue_id)]
    pub issue_id: String,
}

/// Arguments for the `link` and `unlink` commands
#[derive(Parser, Debug, Clone)]
pub struct RelationArgs {
    /// Issue the relation is recorded on
    #[arg(value_parser = validate_issue_id)]
    pub source: String,

    /// Relation kind
    #[arg(value_enum)]
    pub kind: RelationKindArg,

    /// Issue the relation points at
    #[arg(value_parser = validate_issue_id)]
    pub target: String,
}

/// Arguments for the `delete` command
#[derive(Parser, Debug, Clone)]
pub struct DeleteArgs {
    /// Issue ID to delete
    #[arg(value_parser = validate_issue_id)]
    pub issue_id: String,
}

/// Arguments for the `audit` command
#[derive(Parser, Debug, Clone)]
pub struct AuditArgs {}
