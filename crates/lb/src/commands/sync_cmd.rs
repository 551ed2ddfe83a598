//! `lb sync` -- force a foreground push-then-pull (§4.5).

use anyhow::Result;

use crate::cli::SyncArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

pub fn run(ctx: &RuntimeContext, args: &SyncArgs) -> Result<()> {
    if ctx.config.local_only {
        anyhow::bail!("this repo is configured as local-only; there is nothing to sync");
    }

    let client = ctx.require_client()?;
    let scope = ctx.sync_scope(args.team.as_deref())?;
    let engine = lb_sync::SyncEngine::new(&ctx.store, client, scope);

    match engine.ensure_fresh(args.full, ctx.config.cache_ttl_seconds as i64, &ctx.pid_path()) {
        Ok(report) => {
            if ctx.json {
                output_json(&serde_json::json!({
                    "pulled": report.pulled,
                    "pruned": report.pruned,
                    "full": report.full,
                    "pushed": report.pushed.success,
                    "push_failed": report.pushed.failed,
                }));
            } else if !ctx.quiet {
                println!(
                    "Synced ({}): pulled {}, pruned {}, pushed {} (failed {})",
                    if report.full { "full" } else { "incremental" },
                    report.pulled,
                    report.pruned,
                    report.pushed.success,
                    report.pushed.failed,
                );
            }
            Ok(())
        }
        Err(lb_sync::SyncError::Offline(msg)) => {
            let pending = ctx.store.outbox_depth().unwrap_or(0);
            if ctx.json {
                output_json(&serde_json::json!({ "offline": true, "message": msg, "pending_outbox": pending }));
            } else {
                eprintln!("Offline: {msg} ({pending} item(s) pending in the outbox)");
            }
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
