//! `lb dep` -- add/remove dependency edges and print the dependency tree
//! (§4.7).

use anyhow::{Context, Result};
use chrono::Utc;
use lb_core::dependency::Dependency;
use lb_core::enums::{DependencyType, Status};
use lb_sync::outbox_ops::{self, kind, RelationPayload};

use crate::cli::{DepAddArgs, DepArgs, DepCommands, DepRemoveArgs, DepTreeArgs};
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &DepArgs) -> Result<()> {
    match &args.command {
        DepCommands::Add(add_args) => run_add(ctx, add_args),
        DepCommands::Remove(remove_args) => run_remove(ctx, remove_args),
        DepCommands::Tree(tree_args) => run_tree(ctx, tree_args),
    }
}

fn run_add(ctx: &RuntimeContext, args: &DepAddArgs) -> Result<()> {
    let (dep_type, target, inverse) = if let Some(target) = &args.blocks {
        (DependencyType::Blocks, target.clone(), false)
    } else if let Some(target) = &args.blocked_by {
        // Stored as the inverse edge: `id` depends on `target` (§4.7).
        (DependencyType::Blocks, target.clone(), true)
    } else if let Some(target) = &args.related {
        (DependencyType::Related, target.clone(), false)
    } else {
        anyhow::bail!("one of --blocks, --blocked-by, or --related is required");
    };

    let (issue_id, depends_on_id) = if inverse {
        (target.clone(), args.id.clone())
    } else {
        (args.id.clone(), target.clone())
    };
    let dep = Dependency::new(issue_id, depends_on_id, dep_type.clone(), ctx.actor.clone());
    ctx.store.add_dependency(&dep).context("failed to add dependency")?;

    if !ctx.config.local_only {
        let payload = outbox_ops::encode(&RelationPayload {
            issue_remote_id: dep.issue_id.clone(),
            related_remote_id: dep.depends_on_id.clone(),
            relation_type: dep_type.as_str().to_string(),
        })?;
        ctx.enqueue(kind::CREATE_RELATION, &payload).ok();
    } else {
        ctx.notify_export()?;
    }

    if ctx.json {
        output_json(&dep);
    } else if !ctx.quiet {
        println!("{} --[{}]--> {}", dep.issue_id, dep.dep_type, dep.depends_on_id);
    }
    Ok(())
}

fn run_remove(ctx: &RuntimeContext, args: &DepRemoveArgs) -> Result<()> {
    ctx.store.remove_dependency(&args.from, &args.to).context("failed to remove dependency")?;

    if !ctx.config.local_only {
        let payload = outbox_ops::encode(&RelationPayload {
            issue_remote_id: args.from.clone(),
            related_remote_id: args.to.clone(),
            relation_type: DependencyType::Blocks.as_str().to_string(),
        })?;
        ctx.enqueue(kind::DELETE_RELATION, &payload).ok();
    } else {
        ctx.notify_export()?;
    }

    if ctx.json {
        output_json(&serde_json::json!({ "from": args.from, "to": args.to, "removed": true }));
    } else if !ctx.quiet {
        println!("Removed dependency {} -> {}", args.from, args.to);
    }
    Ok(())
}

fn run_tree(ctx: &RuntimeContext, args: &DepTreeArgs) -> Result<()> {
    let max_depth = if args.max_depth <= 0 { i32::MAX } else { args.max_depth };
    let nodes = ctx.store.dependency_tree(&args.id, max_depth).context("failed to walk dependency tree")?;
    let blocked = ctx.store.blocked_set().context("failed to compute the blocked set")?;

    if ctx.json {
        let rows: Vec<serde_json::Value> = nodes
            .iter()
            .map(|n| {
                let issue = ctx.store.get_issue(&n.issue_id).ok();
                let ready = is_ready(&issue, &blocked);
                serde_json::json!({
                    "issue_id": n.issue_id,
                    "depth": n.depth,
                    "type": n.dep_type.as_str(),
                    "ready": ready,
                })
            })
            .collect();
        output_json(&rows);
    } else {
        for n in &nodes {
            let issue = ctx.store.get_issue(&n.issue_id).ok();
            let indent = "  ".repeat(n.depth.max(0) as usize);
            let title = issue.as_ref().map(|i| i.title.clone()).unwrap_or_default();
            let ready_marker = if is_ready(&issue, &blocked) { " [READY]" } else { "" };
            println!("{indent}{} [{}] {}{}", n.issue_id, n.dep_type.as_str(), title, ready_marker);
        }
    }
    Ok(())
}

/// An issue in the tree is `[READY]` iff it's open and has no currently
/// open blockers -- the same definition `blocked_set` uses elsewhere
/// (§4.7, §4.8).
fn is_ready(issue: &Option<lb_core::issue::Issue>, blocked: &std::collections::HashSet<String>) -> bool {
    match issue {
        Some(i) => i.status == Status::Open && !blocked.contains(&i.id),
        None => false,
    }
}
