//! `lb delete` -- delete an issue and its dependency edges (§4.6).

use anyhow::{bail, Context, Result};
use lb_sync::outbox_ops::{self, kind, DeleteIssuePayload};

use crate::cli::DeleteArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &DeleteArgs) -> Result<()> {
    let issue = ctx.store.get_issue(&args.id).with_context(|| format!("issue '{}' not found", args.id))?;

    if !args.force && !ctx.quiet && !ctx.json {
        bail!("refusing to delete '{}' without --force", args.id);
    }

    if args.sync && !ctx.config.local_only {
        let client = ctx.require_client()?;
        client.delete_issue(&args.id)?;
    }

    // Optimistic: the cache row is removed immediately regardless of
    // `--sync`, and a queued delete is enqueued for the worker unless the
    // Remote call above already happened inline or this repo is
    // local-only (§4.4.4 "delete optimistically removes the cache row
    // before enqueue so the worker only calls Remote").
    ctx.store.delete_issue(&args.id).context("failed to delete issue")?;

    if !args.sync && !ctx.config.local_only {
        let payload = outbox_ops::encode(&DeleteIssuePayload { remote_id: args.id.clone() })?;
        ctx.enqueue(kind::DELETE_ISSUE, &payload)?;
    } else {
        ctx.notify_export()?;
    }

    if ctx.json {
        output_json(&serde_json::json!({ "deleted": issue.id }));
    } else if !ctx.quiet {
        println!("Deleted {}", issue.id);
    }
    Ok(())
}
