//! `lb export` -- write the canonical JSONL snapshot on demand (§4.9, §6.3).

use std::fs::{self, File};
use std::io::BufWriter;

use anyhow::{Context, Result};
use lb_core::jsonl::{write_jsonl, ExportRow};
use lb_storage::IssueFilter;

use crate::cli::ExportArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &ExportArgs) -> Result<()> {
    if args.format != "beads" {
        anyhow::bail!("unsupported export format '{}' (only 'beads' is supported)", args.format);
    }

    let output = args.output.clone().unwrap_or_else(|| ctx.lb_dir.join("issues.jsonl"));

    let mut issues = ctx.store.list_issues(&IssueFilter::default()).context("failed to list issues")?;
    issues.sort_by(|a, b| a.id.cmp(&b.id));

    let mut rows = Vec::with_capacity(issues.len());
    for issue in &issues {
        let deps = ctx.store.list_deps_out(&issue.id)?;
        rows.push(ExportRow::from_issue(issue, deps));
    }

    let tmp_path = output.with_extension("jsonl.tmp");
    {
        let file = File::create(&tmp_path).with_context(|| format!("failed to create {}", tmp_path.display()))?;
        write_jsonl(&mut BufWriter::new(file), &rows)?;
    }
    fs::rename(&tmp_path, &output).with_context(|| format!("failed to rename into {}", output.display()))?;

    if ctx.json {
        output_json(&serde_json::json!({ "path": output, "count": rows.len() }));
    } else if !ctx.quiet {
        println!("Wrote {} issue(s) to {}", rows.len(), output.display());
    }
    Ok(())
}
