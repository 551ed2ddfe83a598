//! `lb blocked` -- issues that are open and blocked, with their direct
//! open blockers (§4.8).

use anyhow::{Context, Result};

use crate::cli::ListArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table};

pub fn run(ctx: &RuntimeContext, args: &ListArgs) -> Result<()> {
    if args.sync {
        ctx.ensure_fresh(false, args.team.as_deref())?;
    }

    let mut blocked = ctx.store.blocked_issues().context("failed to compute the blocked set")?;

    if let Some(p) = args.priority {
        blocked.retain(|b| b.issue.priority == p);
    }

    if ctx.json {
        let rows: Vec<serde_json::Value> = blocked
            .iter()
            .map(|b| {
                serde_json::json!({
                    "issue": b.issue,
                    "blockers": b.blockers.iter().map(|i| i.id.clone()).collect::<Vec<_>>(),
                })
            })
            .collect();
        output_json(&rows);
    } else {
        let headers = &["ID", "PRI", "TITLE", "BLOCKED BY"];
        let rows: Vec<Vec<String>> = blocked
            .iter()
            .map(|b| {
                let blockers: Vec<String> = b.blockers.iter().map(|i| i.id.clone()).collect();
                vec![b.issue.id.clone(), format!("P{}", b.issue.priority), b.issue.title.clone(), blockers.join(", ")]
            })
            .collect();
        output_table(headers, &rows);
    }

    Ok(())
}
