//! `lb auth` -- verify and persist Remote credentials (§4.2, §6.1).

use anyhow::{bail, Context, Result};
use lb_config::PartialConfig;
use lb_remote::RemoteClient;

use crate::cli::AuthArgs;
use crate::context::RuntimeContext;

pub fn run(ctx: &RuntimeContext, args: &AuthArgs) -> Result<()> {
    if args.clear {
        lb_config::config::save_global_config(&PartialConfig::default()).context("failed to clear global config")?;
        lb_config::config::save_repo_config(&ctx.repo_root, &PartialConfig::default()).context("failed to clear repo config")?;
        if !ctx.quiet {
            println!("Cleared stored credentials.");
        }
        return Ok(());
    }

    if args.show {
        let masked = ctx.config.api_key.as_ref().map(|k| mask(k));
        if ctx.json {
            crate::output::output_json(&serde_json::json!({
                "api_key": masked,
                "team_key": ctx.config.team_key,
                "team_id": ctx.config.team_id,
                "repo_name": ctx.config.repo_name,
                "local_only": ctx.config.local_only,
            }));
        } else {
            println!("api_key:   {}", masked.as_deref().unwrap_or("(not set)"));
            println!("team_key:  {}", ctx.config.team_key.as_deref().unwrap_or("(not set)"));
            println!("team_id:   {}", ctx.config.team_id.as_deref().unwrap_or("(not set)"));
            println!("repo_name: {}", ctx.config.repo_name.as_deref().unwrap_or("(not set)"));
            println!("local_only: {}", ctx.config.local_only);
        }
        return Ok(());
    }

    let Some(api_key) = ctx.config.api_key.clone() else {
        bail!("no API key found; set LINEAR_API_KEY and re-run 'lb auth'");
    };

    let client = RemoteClient::new(&api_key);
    let user = client.identify_current_user().context("failed to authenticate with Remote")?;

    let mut repo_partial = PartialConfig {
        team_key: ctx.config.team_key.clone(),
        team_id: ctx.config.team_id.clone(),
        repo_name: ctx.config.repo_name.clone(),
        repo_scope: Some(ctx.config.repo_scope),
        cache_ttl_seconds: Some(ctx.config.cache_ttl_seconds),
        local_only: Some(false),
        ..Default::default()
    };

    if let Some(team_key) = &args.team {
        let team = client
            .resolve_team_by_key(team_key)?
            .with_context(|| format!("no team found for key '{team_key}'"))?;
        repo_partial.team_key = Some(team.key);
        repo_partial.team_id = Some(team.id);
    }

    lb_config::config::save_repo_config(&ctx.repo_root, &repo_partial).context("failed to save repo config")?;
    lb_config::config::save_global_config(&PartialConfig { api_key: Some(api_key), ..Default::default() })
        .context("failed to save global config")?;

    if ctx.json {
        crate::output::output_json(&serde_json::json!({ "authenticated_as": user.email }));
    } else if !ctx.quiet {
        println!("Authenticated as {} ({})", user.name, user.email);
    }

    Ok(())
}

fn mask(key: &str) -> String {
    if key.len() <= 8 {
        "*".repeat(key.len())
    } else {
        format!("{}...{}", &key[..4], &key[key.len() - 4..])
    }
}
