//! `lb create` -- create a new issue, either inline against Remote
//! (`--sync`) or as an optimistic cache write queued for the worker
//! (§4.6).

use anyhow::{Context, Result};
use chrono::Utc;
use lb_core::dependency::Dependency;
use lb_core::enums::{DependencyType, IssueType};
use lb_core::issue::Issue;
use lb_core::validation::{validate_issue_type, validate_priority, validate_title};
use lb_sync::outbox_ops::{self, kind, CreateIssuePayload};

use crate::cli::CreateArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &CreateArgs) -> Result<()> {
    validate_title(&args.title)?;
    let priority = args.priority.unwrap_or(2);
    validate_priority(priority)?;
    let issue_type: Option<IssueType> = match &args.issue_type {
        Some(t) => Some(validate_issue_type(t)?),
        None => None,
    };
    let deps = collect_deps(args)?;
    let assignee = match &args.assign {
        Some(v) => ctx.resolve_assignee(v)?,
        None => String::new(),
    };

    let issue = if args.sync || ctx.config.local_only {
        create_direct(ctx, args, priority, issue_type, &assignee, &deps)?
    } else {
        create_queued(ctx, args, priority, issue_type, &assignee, &deps)?
    };

    if ctx.json {
        output_json(&issue);
    } else if !ctx.quiet {
        println!("Created {}: {}", issue.id, issue.title);
    }
    Ok(())
}

/// One requested dependency edge, relative to the issue being created:
/// `incoming` edges have `target` as the source (e.g. `--blocked-by T`
/// means `T` blocks this issue, so the stored edge is `(T, this, blocks)`,
/// §4.7).
struct DepSpec {
    dep_type: DependencyType,
    target: String,
    incoming: bool,
}

/// Merges the repeatable `--blocks`/`--blocked-by`/`--related`/
/// `--discovered-from` flags with the legacy comma-separated `--deps`
/// value into one list (§4.7).
fn collect_deps(args: &CreateArgs) -> Result<Vec<DepSpec>> {
    let mut deps = Vec::new();
    for id in &args.blocks {
        deps.push(DepSpec { dep_type: DependencyType::Blocks, target: id.clone(), incoming: false });
    }
    for id in &args.blocked_by {
        deps.push(DepSpec { dep_type: DependencyType::Blocks, target: id.clone(), incoming: true });
    }
    for id in &args.related {
        deps.push(DepSpec { dep_type: DependencyType::Related, target: id.clone(), incoming: false });
    }
    for id in &args.discovered_from {
        deps.push(DepSpec { dep_type: DependencyType::DiscoveredFrom, target: id.clone(), incoming: false });
    }
    if let Some(raw) = &args.deps {
        for (dep_type, target) in lb_core::validation::parse_deps(raw)? {
            deps.push(DepSpec { dep_type, target, incoming: false });
        }
    }
    Ok(deps)
}

fn create_direct(
    ctx: &RuntimeContext,
    args: &CreateArgs,
    priority: i32,
    issue_type: Option<IssueType>,
    assignee: &str,
    deps: &[DepSpec],
) -> Result<Issue> {
    let description = args.description.clone().unwrap_or_default();

    let id = if ctx.config.local_only {
        lb_sync::engine::next_local_identifier(&ctx.store)?
    } else {
        let client = ctx.require_client()?;
        let scope = ctx.sync_scope(None)?;
        let remote = client.create_issue(&scope.team_id, &args.title, &description, lb_remote::translate::local_priority_to_remote(priority))?;
        if !assignee.is_empty() {
            client.update_issue(&remote.id, serde_json::json!({ "assigneeEmail": assignee }))?;
        }
        remote.identifier
    };

    let now = Utc::now();
    let mut issue = Issue::builder(&args.title)
        .id(&id)
        .description(&description)
        .priority(priority)
        .issue_type(issue_type)
        .assignee(assignee)
        .cached_at(now)
        .build();
    issue.created_at = now;
    issue.updated_at = now;
    ctx.store.upsert_issue(&issue)?;

    add_local_deps(ctx, &id, args.parent.as_deref(), deps)?;
    ctx.notify_export()?;
    Ok(issue)
}

fn create_queued(
    ctx: &RuntimeContext,
    args: &CreateArgs,
    priority: i32,
    issue_type: Option<IssueType>,
    assignee: &str,
    deps: &[DepSpec],
) -> Result<Issue> {
    let description = args.description.clone().unwrap_or_default();
    let id = lb_sync::engine::next_local_identifier(&ctx.store)?;
    let now = Utc::now();
    let mut issue = Issue::builder(&args.title)
        .id(&id)
        .description(&description)
        .priority(priority)
        .issue_type(issue_type)
        .assignee(assignee)
        .cached_at(now)
        .build();
    issue.created_at = now;
    issue.updated_at = now;
    ctx.store.upsert_issue(&issue)?;

    add_local_deps(ctx, &id, args.parent.as_deref(), deps)?;

    let scope = ctx.sync_scope(None).context("cannot queue a create without a resolved team")?;
    let payload = outbox_ops::encode(&CreateIssuePayload {
        local_id: id.clone(),
        team_id: scope.team_id,
        title: args.title.clone(),
        description,
        priority,
        // Dependency edges were already recorded against `id` above; the
        // executor re-homes them under the real identifier once created
        // (`apply_create`'s `deps_out`/`deps_in` rekey), so there's
        // nothing left to defer here.
        deferred_relations: Vec::new(),
    })?;
    ctx.enqueue(kind::CREATE_ISSUE, &payload)?;

    Ok(issue)
}

fn add_local_deps(ctx: &RuntimeContext, id: &str, parent: Option<&str>, deps: &[DepSpec]) -> Result<()> {
    if let Some(parent_id) = parent {
        let dep = Dependency::new(id.to_string(), parent_id.to_string(), DependencyType::ParentChild, ctx.actor.clone());
        ctx.store.add_dependency(&dep)?;
    }
    for spec in deps {
        let dep = if spec.incoming {
            Dependency::new(spec.target.clone(), id.to_string(), spec.dep_type.clone(), ctx.actor.clone())
        } else {
            Dependency::new(id.to_string(), spec.target.clone(), spec.dep_type.clone(), ctx.actor.clone())
        };
        ctx.store.add_dependency(&dep)?;
    }
    Ok(())
}
