//! `lb close` -- close an issue (§4.6).

use anyhow::{Context, Result};
use chrono::Utc;
use lb_core::enums::Status;
use lb_storage::IssueUpdates;
use lb_sync::outbox_ops::{self, kind, UpdateIssuePayload};

use crate::cli::CloseArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &CloseArgs) -> Result<()> {
    let now = Utc::now();
    let mut description = None;
    if let Some(reason) = &args.reason {
        let current = ctx.store.get_issue(&args.id).with_context(|| format!("issue '{}' not found", args.id))?;
        description = Some(format!("{}\n\nClosed: {reason}", current.description).trim().to_string());
    }

    ctx.store
        .close_issue(&args.id, now)
        .with_context(|| format!("issue '{}' not found", args.id))?;
    if let Some(description) = &description {
        let updates = IssueUpdates { description: Some(description.clone()), ..Default::default() };
        ctx.store.update_issue(&args.id, &updates, now)?;
    }

    if args.sync || ctx.config.local_only {
        if !ctx.config.local_only {
            let client = ctx.require_client()?;
            let state_type = lb_remote::translate::status_to_workflow_state_type(&Status::Closed);
            client.update_issue(&args.id, serde_json::json!({ "workflowStateType": state_type }))?;
        }
        ctx.notify_export()?;
    } else {
        let payload = outbox_ops::encode(&UpdateIssuePayload {
            remote_id: args.id.clone(),
            local_id: args.id.clone(),
            title: None,
            description,
            status: Some(Status::Closed.as_str().to_string()),
            priority: None,
            assignee: None,
        })?;
        ctx.enqueue(kind::UPDATE_ISSUE, &payload)?;
    }

    let closed = ctx.store.get_issue(&args.id)?;
    if ctx.json {
        output_json(&closed);
    } else if !ctx.quiet {
        println!("Closed {}", closed.id);
    }
    Ok(())
}
