//! `lb list` -- list issues with status/priority/type filtering.

use anyhow::{Context, Result};
use lb_core::validation::{validate_issue_type, validate_status};
use lb_storage::IssueFilter;

use crate::cli::ListArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table};

pub fn run(ctx: &RuntimeContext, args: &ListArgs) -> Result<()> {
    if args.sync {
        ctx.ensure_fresh(false, args.team.as_deref())?;
    }

    let mut filter = IssueFilter::default();
    if let Some(s) = &args.status {
        filter.status = Some(validate_status(s)?);
    } else if !args.all {
        // Default view excludes closed issues, mirroring `ready`/`blocked`.
        filter.status = None;
    }
    if let Some(p) = args.priority {
        filter.priority = Some(p);
    }
    if let Some(t) = &args.issue_type {
        filter.issue_type = Some(validate_issue_type(t)?);
    }

    let mut issues = ctx.store.list_issues(&filter).context("failed to list issues")?;
    if args.status.is_none() && !args.all {
        issues.retain(|i| !i.is_closed());
    }

    if ctx.json {
        output_json(&issues);
    } else {
        let headers = &["ID", "PRI", "STATUS", "TITLE", "ASSIGNEE"];
        let rows: Vec<Vec<String>> = issues
            .iter()
            .map(|i| vec![i.id.clone(), format!("P{}", i.priority), i.status.as_str().to_string(), i.title.clone(), i.assignee.clone()])
            .collect();
        output_table(headers, &rows);
    }

    Ok(())
}
