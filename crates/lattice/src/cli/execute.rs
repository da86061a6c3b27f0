//! Command execution logic.

use anyhow::Result;

use super::args::{AuditArgs, CreateArgs, DeleteArgs, InitArgs, RelationArgs, ShowArgs};
use crate::app::App;
use crate::domain::{Actor, IssueId, NewIssue, ProjectId};
use crate::error::Error;
use crate::output::{self, OutputMode};

/// Execute the init command
pub async fn execute_init(args: &InitArgs, actor: &Actor) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let owner = Some(actor.as_str()).filter(|name| !name.is_empty());
    let result = init::init(&current_dir, args.prefix.as_deref(), owner).await?;

    if !args.quiet {
        println!("Initialized lattice in {}", result.lattice_dir.display());
        println!("  Config: {}", result.config_file.display());
        println!("  Issues: {}", result.issues_file.display());
        println!("  Issue prefix: {}", result.prefix);
        match &result.owner {
            Some(owner) => println!("  Owner: {owner}"),
            None => println!("  No owner registered; add one under 'memberships' in the config"),
        }
    }

    Ok(())
}

/// Execute the create command
pub async fn execute_create(
    app: &App,
    args: &CreateArgs,
    actor: &Actor,
    output_mode: OutputMode,
) -> Result<()> {
    let project = args.project.as_deref().unwrap_or(app.prefix());
    let new_issue = NewIssue {
        project_id: ProjectId::new(project),
        title: args.title.clone(),
        description: args.description.clone().unwrap_or_default(),
        issue_type: args.issue_type.into(),
    };

    let issue = app.graph().create_issue(new_issue, actor).await?;

    match output_mode {
        OutputMode::Json => output::print_json(&issue)?,
        OutputMode::Text => output::print_message(&format!("Created issue: {}", issue.id))?,
    }
    Ok(())
}

/// Execute the show command
pub async fn execute_show(app: &App, args: &ShowArgs, output_mode: OutputMode) -> Result<()> {
    let id = IssueId::new(&args.issue_id);
    let issue = app
        .graph()
        .get_issue(&id)
        .await?
        .ok_or(Error::IssueNotFound(id))?;
    output::print_issue_details(&issue, output_mode)?;
    Ok(())
}

/// Execute the link command
pub async fn execute_link(
    app: &App,
    args: &RelationArgs,
    actor: &Actor,
    output_mode: OutputMode,
) -> Result<()> {
    let source = IssueId::new(&args.source);
    let target = IssueId::new(&args.target);
    let snapshot = app
        .graph()
        .add_relation(&source, args.kind.into(), &target, actor)
        .await?;
    output::print_snapshot(&snapshot, output_mode)?;
    Ok(())
}

/// Execute the unlink command
pub async fn execute_unlink(
    app: &App,
    args: &RelationArgs,
    actor: &Actor,
    output_mode: OutputMode,
) -> Result<()> {
    let source = IssueId::new(&args.source);
    let target = IssueId::new(&args.target);
    app.graph()
        .remove_relation(&source, args.kind.into(), &target, actor)
        .await?;

    let snapshot = app.graph().relations(&source).await?;
    output::print_snapshot(&snapshot, output_mode)?;
    Ok(())
}

/// Execute the delete command
pub async fn execute_delete(
    app: &App,
    args: &DeleteArgs,
    actor: &Actor,
    output_mode: OutputMode,
) -> Result<()> {
    let id = IssueId::new(&args.issue_id);
    let report = app.graph().delete_issue(&id, actor).await?;
    output::print_delete_report(&id, &report, output_mode)?;
    Ok(())
}

/// Execute the audit command
///
/// Fails when problems are found so scripts can gate on the exit code.
pub async fn execute_audit(app: &App, _args: &AuditArgs, output_mode: OutputMode) -> Result<()> {
    let report = app.graph().audit().await?;
    output::print_audit(&report, output_mode)?;
    if !report.is_clean() {
        anyhow::bail!("{} relation problem(s) found", report.findings.len());
    }
    Ok(())
}
