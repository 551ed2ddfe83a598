//! `lb update` -- mutate fields on an existing issue (§4.6).

use anyhow::{Context, Result};
use chrono::Utc;
use lb_core::dependency::Dependency;
use lb_core::enums::DependencyType;
use lb_core::validation::{validate_priority, validate_status, validate_title};
use lb_storage::IssueUpdates;
use lb_sync::outbox_ops::{self, kind, UpdateIssuePayload};

use crate::cli::UpdateArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &UpdateArgs) -> Result<()> {
    if let Some(title) = &args.title {
        validate_title(title)?;
    }
    if let Some(p) = args.priority {
        validate_priority(p)?;
    }
    let status = match &args.status {
        Some(s) => Some(validate_status(s)?),
        None => None,
    };

    let assignee = if args.unassign {
        Some(String::new())
    } else if let Some(v) = &args.assign {
        Some(ctx.resolve_assignee(v)?)
    } else {
        None
    };

    let now = Utc::now();

    let updates = IssueUpdates {
        title: args.title.clone(),
        description: args.description.clone(),
        status: status.clone(),
        priority: args.priority,
        issue_type: None,
        assignee: assignee.clone().map(Some),
    };
    ctx.store
        .update_issue(&args.id, &updates, now)
        .with_context(|| format!("issue '{}' not found", args.id))?;

    if let Some(parent) = &args.parent {
        ctx.store.clear_parent_child_edge(&args.id)?;
        if !parent.is_empty() {
            let dep = Dependency::new(args.id.clone(), parent.clone(), DependencyType::ParentChild, ctx.actor.clone());
            ctx.store.add_dependency(&dep)?;
        }
    }
    for id in &args.blocks {
        ctx.store.add_dependency(&Dependency::new(args.id.clone(), id.clone(), DependencyType::Blocks, ctx.actor.clone()))?;
    }
    for id in &args.blocked_by {
        // Stored as the inverse edge: `id` blocks `args.id` (§4.7).
        ctx.store.add_dependency(&Dependency::new(id.clone(), args.id.clone(), DependencyType::Blocks, ctx.actor.clone()))?;
    }
    for id in &args.related {
        ctx.store.add_dependency(&Dependency::new(args.id.clone(), id.clone(), DependencyType::Related, ctx.actor.clone()))?;
    }

    if args.sync || ctx.config.local_only {
        if !ctx.config.local_only {
            let client = ctx.require_client()?;
            let remote_id = &args.id;
            let mut fields = serde_json::Map::new();
            if let Some(title) = &args.title {
                fields.insert("title".into(), title.clone().into());
            }
            if let Some(description) = &args.description {
                fields.insert("description".into(), description.clone().into());
            }
            if let Some(p) = args.priority {
                fields.insert("priority".into(), lb_remote::translate::local_priority_to_remote(p).into());
            }
            if let Some(a) = &assignee {
                fields.insert("assigneeEmail".into(), a.clone().into());
            }
            if let Some(s) = &status {
                fields.insert("workflowStateType".into(), lb_remote::translate::status_to_workflow_state_type(s).into());
            }
            if !fields.is_empty() {
                client.update_issue(remote_id, serde_json::Value::Object(fields))?;
            }
        }
        ctx.notify_export()?;
    } else {
        let payload = outbox_ops::encode(&UpdateIssuePayload {
            remote_id: args.id.clone(),
            local_id: args.id.clone(),
            title: args.title.clone(),
            description: args.description.clone(),
            status: status.as_ref().map(|s| s.as_str().to_string()),
            priority: args.priority,
            assignee,
        })?;
        ctx.enqueue(kind::UPDATE_ISSUE, &payload)?;
    }

    let updated = ctx.store.get_issue(&args.id)?;
    if ctx.json {
        output_json(&updated);
    } else if !ctx.quiet {
        println!("Updated {}", updated.id);
    }
    Ok(())
}
