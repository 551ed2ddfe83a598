//! `lb migrate` -- one-off cache/Remote maintenance operations.

use anyhow::Result;
use lb_core::label::Label;
use lb_config::RepoScope as ConfigRepoScope;
use lb_config::PartialConfig;
use tracing::warn;

use crate::cli::{MigrateArgs, MigrateCommands, MigrateRemoveTypeLabelsArgs, MigrateToProjectArgs};
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &MigrateArgs) -> Result<()> {
    match &args.command {
        MigrateCommands::RemoveTypeLabels(sub) => remove_type_labels(ctx, sub),
        MigrateCommands::ToProject(sub) => to_project(ctx, sub),
    }
}

/// Drops the per-type label (`type:<t>`) on every locally cached issue
/// that already carries a first-class `issue_type`, now that the field
/// makes the label redundant. `--remove-label` actually issues the
/// Remote mutation; without it, the command only reports candidates.
fn remove_type_labels(ctx: &RuntimeContext, args: &MigrateRemoveTypeLabelsArgs) -> Result<()> {
    let issues = ctx.store.list_issues(&lb_storage::IssueFilter::default())?;
    let candidates: Vec<_> = issues.iter().filter(|i| i.issue_type.is_some()).collect();

    let mut removed = 0usize;
    if !args.dry_run && args.remove_label && !ctx.config.local_only {
        let client = ctx.require_client()?;
        let scope = ctx.sync_scope(None)?;
        for issue in &candidates {
            let issue_type = issue.issue_type.as_ref().unwrap();
            let label_name = Label::type_scope_name(issue_type);
            match client
                .get_or_create_label(&scope.team_id, &label_name)
                .and_then(|label| client.update_issue(&issue.id, serde_json::json!({ "removeLabelIds": [label.id] })))
            {
                Ok(_) => removed += 1,
                Err(e) => warn!(issue = %issue.id, error = %e, "failed to remove type label"),
            }
        }
    }

    if ctx.json {
        output_json(&serde_json::json!({
            "candidates": candidates.len(),
            "removed": removed,
            "dry_run": args.dry_run,
        }));
    } else if !ctx.quiet {
        if args.dry_run {
            println!("{} issue(s) carry a redundant type label", candidates.len());
        } else if args.remove_label {
            println!("Removed the type label on {removed} issue(s)");
        } else {
            println!("{} issue(s) carry a redundant type label (pass --remove-label to remove it)", candidates.len());
        }
    }
    Ok(())
}

/// Migrates repo scoping from a `repo:<name>` label to a Linear project,
/// persisting the new `repo_scope` in the repo's own config.
fn to_project(ctx: &RuntimeContext, args: &MigrateToProjectArgs) -> Result<()> {
    let before = ctx.config.repo_scope.clone();
    let affected = ctx.store.list_issues(&lb_storage::IssueFilter::default())?.len();

    if args.dry_run {
        if ctx.json {
            output_json(&serde_json::json!({
                "before": format!("{before:?}"),
                "after": "Project",
                "affected": affected,
                "dry_run": true,
            }));
        } else if !ctx.quiet {
            println!("Would switch repo scope from {before:?} to Project ({affected} cached issue(s))");
        }
        return Ok(());
    }

    let partial = PartialConfig {
        api_key: None,
        team_key: ctx.config.team_key.clone(),
        team_id: ctx.config.team_id.clone(),
        repo_name: ctx.config.repo_name.clone(),
        repo_scope: Some(ConfigRepoScope::Project),
        cache_ttl_seconds: Some(ctx.config.cache_ttl_seconds),
        local_only: Some(ctx.config.local_only),
    };
    lb_config::config::save_repo_config(&ctx.repo_root, &partial)?;

    let mut label_removed = 0usize;
    if args.remove_label && !ctx.config.local_only {
        if let (Ok(client), Some(repo_name)) = (ctx.require_client(), &ctx.config.repo_name) {
            let label_name = Label::repo_scope_name(repo_name);
            let issues = ctx.store.list_issues(&lb_storage::IssueFilter::default())?;
            if let Ok(scope) = ctx.sync_scope(None) {
                if let Ok(label) = client.get_or_create_label(&scope.team_id, &label_name) {
                    for issue in &issues {
                        if client.update_issue(&issue.id, serde_json::json!({ "removeLabelIds": [label.id] })).is_ok() {
                            label_removed += 1;
                        }
                    }
                }
            }
        }
    }

    if ctx.json {
        output_json(&serde_json::json!({
            "before": format!("{before:?}"),
            "after": "Project",
            "label_removed": label_removed,
        }));
    } else if !ctx.quiet {
        println!("Repo scope switched from {before:?} to Project ({label_removed} label removal(s))");
    }
    Ok(())
}
