//! Per-invocation runtime state: repo discovery, config resolution, the
//! open store, and (when configured) a Remote client.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use lb_config::{Config, PartialConfig, RepoScope as ConfigRepoScope};
use lb_remote::RemoteClient;
use lb_storage::Store;
use lb_sync::RepoScope as SyncRepoScope;

use crate::cli::GlobalArgs;

pub struct RuntimeContext {
    pub repo_root: PathBuf,
    pub lb_dir: PathBuf,
    pub db_path: PathBuf,
    pub config: Config,
    pub store: Store,
    pub client: Option<RemoteClient>,
    pub json: bool,
    pub quiet: bool,
    pub actor: String,
    /// Whether the cache database file existed before this invocation
    /// opened (and implicitly created) it -- `init` needs this to tell a
    /// fresh cache apart from a pre-existing one.
    pub cache_preexisted: bool,
}

impl RuntimeContext {
    pub fn from_global_args(global: &GlobalArgs) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to read the current directory")?;
        let repo_root = lb_config::dirs::find_repo_root(&cwd);

        let (lb_dir, db_path) = match &global.db {
            Some(db) => {
                let lb_dir = db.parent().map(Path::to_path_buf).unwrap_or_else(|| repo_root.clone());
                (lb_dir, db.clone())
            }
            None => {
                let lb_dir = lb_config::dirs::lb_dir(&repo_root);
                (lb_dir.clone(), lb_dir.join("cache.db"))
            }
        };

        let config = lb_config::config::resolve(&repo_root, PartialConfig::default())
            .context("failed to resolve configuration")?;

        std::fs::create_dir_all(&lb_dir)
            .with_context(|| format!("failed to create {}", lb_dir.display()))?;
        let cache_preexisted = db_path.exists();
        let store = Store::open(&db_path)
            .with_context(|| format!("failed to open cache database at {}", db_path.display()))?;

        let client = if config.local_only {
            None
        } else {
            config.api_key.as_deref().map(RemoteClient::new)
        };

        let actor = lb_git::get_git_user_name().unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            repo_root,
            lb_dir,
            db_path,
            config,
            store,
            client,
            json: global.json,
            quiet: global.quiet,
            actor,
            cache_preexisted,
        })
    }

    pub fn pid_path(&self) -> PathBuf {
        self.lb_dir.join("sync.pid")
    }

    pub fn require_client(&self) -> Result<&RemoteClient> {
        if self.config.local_only {
            bail!("this repo is configured as local-only; run 'lb auth' to connect it to Remote");
        }
        self.client
            .as_ref()
            .context("no Remote API key configured; run 'lb auth' first")
    }

    /// Resolves the sync scope for an optional per-call team override,
    /// falling back to the configured team key/id and repo name (§4.2,
    /// §4.5 repo scoping).
    pub fn sync_scope(&self, team_override: Option<&str>) -> Result<SyncRepoScope> {
        let client = self.require_client()?;
        resolve_scope(&self.config, client, team_override)
    }

    /// Brings the cache up to date unless running in local-only mode, in
    /// which case it's a no-op (§4.5). An `Offline` error is reported as a
    /// stale-cache notice rather than propagated, since reads degrade
    /// gracefully to cache-only per §4.5/§7.
    pub fn ensure_fresh(&self, force_full: bool, team_override: Option<&str>) -> Result<()> {
        if self.config.local_only {
            return Ok(());
        }
        let client = match self.client.as_ref() {
            Some(c) => c,
            None => return Ok(()),
        };
        let scope = resolve_scope(&self.config, client, team_override)?;
        let engine = lb_sync::SyncEngine::new(&self.store, client, scope);
        match engine.ensure_fresh(force_full, self.config.cache_ttl_seconds as i64, &self.pid_path()) {
            Ok(_) => Ok(()),
            Err(lb_sync::SyncError::Offline(msg)) => {
                if !self.quiet {
                    eprintln!("warning: offline ({msg}), showing possibly stale cached data");
                }
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Enqueues a durable outbox row and signals the background worker and
    /// JSONL scheduler, per the write path (K -> D -> J -> F) in §4.4.1.
    pub fn enqueue(&self, operation: &str, payload: &str) -> Result<()> {
        self.store.enqueue_outbox(operation, payload)?;
        lb_sync::launcher::ensure_worker_running(&self.db_path, &self.lb_dir)?;
        lb_sync::export::request_export(&self.db_path, &self.lb_dir)?;
        Ok(())
    }

    /// Requests a JSONL snapshot refresh without touching the outbox, for
    /// local-only writes that never go through the worker.
    pub fn notify_export(&self) -> Result<()> {
        lb_sync::export::request_export(&self.db_path, &self.lb_dir)?;
        Ok(())
    }

    /// Resolves "me" against the authenticated viewer's email, leaving any
    /// other value untouched.
    pub fn resolve_assignee(&self, value: &str) -> Result<String> {
        if value != "me" {
            return Ok(value.to_string());
        }
        let client = self.require_client()?;
        let user = client.identify_current_user()?;
        Ok(user.email)
    }

    /// The authenticated viewer's email, for assignee-scoping `ready`
    /// (§4.8). Best-effort: `None` in local-only mode or if Remote can't be
    /// reached, in which case scoping is skipped rather than failing.
    pub fn viewer_email(&self) -> Option<String> {
        let client = self.client.as_ref()?;
        match client.identify_current_user() {
            Ok(user) => Some(user.email),
            Err(e) => {
                tracing::warn!(error = %e, "failed to resolve the current Remote user for assignee scoping");
                None
            }
        }
    }
}

fn resolve_scope(config: &Config, client: &RemoteClient, team_override: Option<&str>) -> Result<SyncRepoScope> {
    let team_key = team_override.map(str::to_string).or_else(|| config.team_key.clone());

    let team_id = if let Some(id) = &config.team_id {
        id.clone()
    } else if let Some(key) = &team_key {
        client
            .resolve_team_by_key(key)?
            .with_context(|| format!("no team found for key '{key}'"))?
            .id
    } else {
        bail!("no team configured; run 'lb auth --team <KEY>' or set LB_TEAM_KEY/LB_TEAM_ID");
    };

    let repo_name = config.repo_name.clone().or_else(|| lb_git::repo_name_heuristic(&lb_config::dirs::find_repo_root(&std::env::current_dir().unwrap_or_default())));

    let (label_name, project_name) = match config.repo_scope {
        ConfigRepoScope::Label => (repo_name.map(|r| lb_core::label::Label::repo_scope_name(&r)), None),
        ConfigRepoScope::Project => (None, repo_name),
        ConfigRepoScope::Both => (repo_name.clone().map(|r| lb_core::label::Label::repo_scope_name(&r)), repo_name),
    };

    Ok(SyncRepoScope { team_id, label_name, project_name })
}

/// Standalone variant of [`RuntimeContext::sync_scope`] used by the
/// `--worker` re-entry path in `main.rs`, which has no `RuntimeContext`
/// (it never touches the CLI's own config-resolution/client wiring).
pub fn resolve_sync_scope(_store: &Store, client: &RemoteClient, config: &Config) -> Result<SyncRepoScope> {
    resolve_scope(config, client, None)
}
