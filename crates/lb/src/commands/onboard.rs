//! `lb onboard` -- a quick-start summary for a new contributor.

use anyhow::{Context, Result};

use crate::cli::OnboardArgs;
use crate::context::RuntimeContext;

pub fn run(ctx: &RuntimeContext, args: &OnboardArgs) -> Result<()> {
    let text = render(ctx);

    match &args.output {
        Some(path) => {
            std::fs::write(path, &text).with_context(|| format!("failed to write {}", path.display()))?;
            if !ctx.quiet {
                println!("Wrote onboarding summary to {}", path.display());
            }
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn render(ctx: &RuntimeContext) -> String {
    let mode = if ctx.config.local_only { "local-only (no Remote connection)" } else { "connected to Remote" };
    format!(
        "# lb quick start\n\n\
         This repo's cache lives at {}.\n\
         Mode: {mode}.\n\n\
         Common commands:\n\
         \x20 lb list              show open issues\n\
         \x20 lb ready             show unblocked work\n\
         \x20 lb create \"Title\"    create an issue (queued, unless --sync)\n\
         \x20 lb show <id>         inspect one issue, with --sync to hydrate relations\n\
         \x20 lb dep add/remove/tree   manage dependency edges\n\
         \x20 lb sync --full       force a full pull\n\n\
         Run `lb auth` first if `lb whoami` reports no credentials.\n",
        ctx.db_path.display(),
    )
}
