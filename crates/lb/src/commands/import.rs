//! `lb import` -- load issues from an external JSONL snapshot into the
//! local cache (§6.2 `import-map.jsonl`).

use std::fs::{self, File};
use std::io::BufReader;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use lb_core::dependency::Dependency;
use lb_core::enums::Status;
use lb_core::issue::Issue;
use lb_core::jsonl::read_jsonl;
use serde::Serialize;

use crate::cli::ImportArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

#[derive(Serialize)]
struct ImportMapEntry<'a> {
    bd_id: &'a str,
    linear_id: &'a str,
}

pub fn run(ctx: &RuntimeContext, args: &ImportArgs) -> Result<()> {
    let import_map_path = ctx.lb_dir.join("import-map.jsonl");
    if import_map_path.exists() && !args.force && !args.dry_run {
        bail!("import-map.jsonl already has entries from a prior import; pass --force to import again");
    }

    let since: Option<DateTime<Utc>> = match &args.since {
        Some(s) => Some(
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .with_context(|| format!("invalid --since date '{s}' (expected RFC3339)"))?,
        ),
        None => None,
    };

    let file = File::open(&args.source).with_context(|| format!("failed to open {}", args.source.display()))?;
    let mut imported = 0usize;
    let mut skipped = 0usize;
    let mut map_lines = Vec::new();

    for row in read_jsonl(BufReader::new(file)) {
        let row = row.with_context(|| format!("failed to parse {}", args.source.display()))?;

        if row.status == Status::Closed && !args.include_closed {
            skipped += 1;
            continue;
        }
        if let Some(since) = since {
            if row.updated_at < since {
                skipped += 1;
                continue;
            }
        }

        if !args.dry_run {
            let mut issue = Issue::builder(&row.title)
                .id(&row.id)
                .description(row.description.clone().unwrap_or_default())
                .priority(row.priority)
                .issue_type(row.issue_type.clone())
                .build();
            issue.status = row.status.clone();
            issue.created_at = row.created_at;
            issue.updated_at = row.updated_at;
            issue.closed_at = row.closed_at;
            ctx.store.upsert_issue(&issue)?;

            for dep in &row.dependencies {
                let dep = Dependency::new(dep.issue_id.clone(), dep.depends_on_id.clone(), dep.dep_type.clone(), "import".to_string());
                ctx.store.add_dependency(&dep)?;
            }
        }

        map_lines.push(serde_json::to_string(&ImportMapEntry { bd_id: &row.id, linear_id: &row.id })?);
        imported += 1;
    }

    if !args.dry_run {
        fs::write(&import_map_path, map_lines.join("\n") + if map_lines.is_empty() { "" } else { "\n" })
            .with_context(|| format!("failed to write {}", import_map_path.display()))?;
        ctx.notify_export()?;
    }

    if ctx.json {
        output_json(&serde_json::json!({ "imported": imported, "skipped": skipped, "dry_run": args.dry_run }));
    } else if !ctx.quiet {
        if args.dry_run {
            println!("Would import {imported} issue(s), skip {skipped}");
        } else {
            println!("Imported {imported} issue(s), skipped {skipped}");
        }
    }
    Ok(())
}
