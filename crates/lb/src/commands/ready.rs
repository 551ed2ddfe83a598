//! `lb ready` -- issues that are open and unblocked (§4.8).

use anyhow::{Context, Result};

use crate::cli::ListArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table};

pub fn run(ctx: &RuntimeContext, args: &ListArgs) -> Result<()> {
    if args.sync {
        ctx.ensure_fresh(false, args.team.as_deref())?;
    }

    let mut issues = ctx.store.ready_set(None).context("failed to compute the ready set")?;

    if !args.all {
        if let Some(viewer) = ctx.viewer_email() {
            issues.retain(|i| i.assignee.is_empty() || i.assignee == viewer);
        }
    }

    if let Some(p) = args.priority {
        issues.retain(|i| i.priority == p);
    }
    if let Some(t) = &args.issue_type {
        let wanted = lb_core::enums::IssueType::from(t.as_str());
        issues.retain(|i| i.issue_type.as_ref() == Some(&wanted));
    }

    if ctx.json {
        output_json(&issues);
    } else {
        let headers = &["ID", "PRI", "TITLE", "ASSIGNEE"];
        let rows: Vec<Vec<String>> = issues
            .iter()
            .map(|i| vec![i.id.clone(), format!("P{}", i.priority), i.title.clone(), i.assignee.clone()])
            .collect();
        output_table(headers, &rows);
    }

    Ok(())
}
