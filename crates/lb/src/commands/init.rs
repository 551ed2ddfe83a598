//! `lb init` -- initialize the local cache in the current repository.

use anyhow::{bail, Context, Result};

use crate::cli::InitArgs;
use crate::context::RuntimeContext;

const GITIGNORE_CONTENT: &str = "# lb cache files\ncache.db\ncache.db-wal\ncache.db-shm\nsync.pid\nsync.log\nissues.jsonl.tmp\n";

pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    if !args.force && ctx.cache_preexisted {
        bail!(
            "a cache already exists at {}\n\nTo reinitialize (data loss warning): rm -rf {} && lb init\nOr pass --force.",
            ctx.db_path.display(),
            ctx.lb_dir.display(),
        );
    }

    let gitignore_path = ctx.lb_dir.join(".gitignore");
    if !gitignore_path.exists() {
        std::fs::write(&gitignore_path, GITIGNORE_CONTENT)
            .with_context(|| format!("failed to write {}", gitignore_path.display()))?;
    }

    if args.local_only {
        let partial = lb_config::PartialConfig { local_only: Some(true), ..Default::default() };
        lb_config::config::save_repo_config(&ctx.repo_root, &partial)
            .context("failed to write repo config")?;
    }

    let jsonl_path = ctx.lb_dir.join("issues.jsonl");
    if !jsonl_path.exists() {
        std::fs::write(&jsonl_path, "").with_context(|| format!("failed to write {}", jsonl_path.display()))?;
    }

    if ctx.json {
        crate::output::output_json(&serde_json::json!({
            "initialized": true,
            "path": ctx.lb_dir,
            "local_only": args.local_only,
        }));
    } else if !ctx.quiet {
        println!("Initialized an lb cache in {}", ctx.lb_dir.display());
        if args.local_only {
            println!("Running in local-only mode: no Remote connection configured.");
        } else {
            println!("Run 'lb auth' to connect this repo to Remote.");
        }
    }

    Ok(())
}
