//! `lb show` -- show a single issue, optionally hydrating its non-blocking
//! relations from Remote first (§4.5 "hydrated on demand by show --sync").

use anyhow::{Context, Result};
use lb_core::dependency::Dependency;
use lb_core::enums::DependencyType;

use crate::cli::ShowArgs;
use crate::context::RuntimeContext;
use crate::output::{format_issue_detail, output_json};

pub fn run(ctx: &RuntimeContext, args: &ShowArgs) -> Result<()> {
    if args.sync {
        hydrate_relations(ctx, &args.id)?;
    }

    let issue = ctx.store.get_issue(&args.id).with_context(|| format!("issue '{}' not found", args.id))?;
    let deps_out = ctx.store.list_deps_out(&args.id).context("failed to load dependencies")?;
    let deps_in = ctx.store.list_deps_in(&args.id).context("failed to load dependencies")?;

    if ctx.json {
        output_json(&serde_json::json!({
            "issue": issue,
            "depends_on": deps_out,
            "depended_on_by": deps_in,
        }));
    } else {
        print!("{}", format_issue_detail(&issue));
        if !deps_out.is_empty() {
            println!("  depends on:");
            for d in &deps_out {
                println!("    [{}] {}", d.dep_type.as_str(), d.depends_on_id);
            }
        }
        if !deps_in.is_empty() {
            println!("  depended on by:");
            for d in &deps_in {
                println!("    [{}] {}", d.dep_type.as_str(), d.issue_id);
            }
        }
    }

    Ok(())
}

/// Fetches the issue's relations from Remote and merges them into the
/// local cache; best-effort per §4.3/§4.5, so a failure here is reported
/// but does not abort the command.
fn hydrate_relations(ctx: &RuntimeContext, id: &str) -> Result<()> {
    let client = match ctx.client.as_ref() {
        Some(c) => c,
        None => return Ok(()),
    };
    let issue = ctx.store.get_issue(id)?;
    let Some(remote_id) = issue_remote_id(&issue) else {
        return Ok(());
    };

    match client.fetch_relations(&remote_id) {
        Ok(relations) => {
            for rel in relations {
                let dep_type = DependencyType::from(rel.relation_type.as_str());
                let dep = Dependency::new(id.to_string(), rel.related_issue_id, dep_type, "");
                if let Err(e) = ctx.store.add_dependency(&dep) {
                    tracing::warn!(error = %e, "failed to hydrate a relation");
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "failed to fetch relations from Remote"),
    }
    Ok(())
}

/// The store caches issues by their own identifier, which for
/// Remote-originated issues *is* the remote id (§4.5 `translate`).
/// `LOCAL-<n>` issues have no remote counterpart to hydrate.
fn issue_remote_id(issue: &lb_core::issue::Issue) -> Option<String> {
    if issue.id.starts_with("LOCAL-") {
        None
    } else {
        Some(issue.id.clone())
    }
}
