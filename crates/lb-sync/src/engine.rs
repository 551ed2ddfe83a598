//! The sync engine: incremental/full selection, paginated pull with
//! pruning, repo scoping, and parent-child hydration (§4.5).

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use lb_core::dependency::Dependency;
use lb_core::enums::{DependencyType, IssueType, Status};
use lb_core::issue::Issue;
use lb_remote::translate::{remote_priority_to_local, workflow_state_type_to_status};
use lb_remote::RemoteError;
use lb_remote::types::{IssueScopeFilter, RemoteIssue};
use lb_remote::RemoteClient;
use lb_storage::Store;
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};
use crate::executor::{self, PushResult};
use crate::pidfile::PidFile;

/// A full pull is forced when the last full sync is older than this (§4.5
/// "(a) `last_full_sync` is older than 24h"); the second trigger,
/// `sync_run_count mod 3 == 0`, is checked alongside it.
const FULL_SYNC_INTERVAL: ChronoDuration = ChronoDuration::hours(24);

/// The other `needs_full_sync` trigger: force a full pull every third sync
/// run even within the 24h window, bounding pruning staleness between
/// full pulls regardless of how often `ensure_fresh` is called (§4.5).
const FULL_SYNC_RUN_MODULUS: u64 = 3;

const PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct RepoScope {
    pub team_id: String,
    pub label_name: Option<String>,
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub pulled: usize,
    pub pruned: i64,
    pub full: bool,
    pub pushed: PushResult,
}

pub struct SyncEngine<'a> {
    store: &'a Store,
    client: &'a RemoteClient,
    scope: RepoScope,
}

impl<'a> SyncEngine<'a> {
    pub fn new(store: &'a Store, client: &'a RemoteClient, scope: RepoScope) -> Self {
        Self { store, client, scope }
    }

    /// Whether the next sync should be a full pull rather than
    /// incremental: either the last full sync is stale, or every third
    /// sync run forces one regardless (§4.5).
    pub fn needs_full_sync(&self) -> Result<bool> {
        let stale = match self.store.last_full_sync_at()? {
            None => true,
            Some(last) => Utc::now() - last > FULL_SYNC_INTERVAL,
        };
        let periodic = self.store.sync_run_count()? % FULL_SYNC_RUN_MODULUS == 0;
        Ok(stale || periodic)
    }

    /// Brings the cache up to date: a no-op if the cache is still within
    /// `cache_ttl_seconds` and `force_full` is not set; otherwise drains the
    /// outbox inline (push-before-pull, §4.5) and pulls. If a background
    /// worker is already running and this call would otherwise trigger a
    /// full pull, falls back to an incremental pull instead -- the full
    /// pull is left to the worker's own post-drain pull (§4.5 "implicitly
    /// deferred to the background worker").
    pub fn ensure_fresh(&self, force_full: bool, cache_ttl_seconds: i64, pid_path: &std::path::Path) -> Result<SyncReport> {
        if !force_full {
            if let Some(last) = self.store.last_sync_at()? {
                let ttl = ChronoDuration::seconds(cache_ttl_seconds.max(0));
                if Utc::now() - last < ttl {
                    debug!("cache still fresh, skipping sync");
                    return Ok(SyncReport::default());
                }
            }
        }

        let pushed = self.push_before_pull()?;

        let mut full = force_full || self.needs_full_sync()?;
        if full && !force_full && !PidFile::new(pid_path).should_spawn() {
            debug!("a worker is already running, deferring the full pull to it");
            full = false;
        }

        let result = self.pull(full);
        match result {
            Ok(mut report) => {
                report.pushed = pushed;
                Ok(report)
            }
            Err(SyncError::Remote(RemoteError::Network(msg))) => {
                warn!(error = %msg, "remote unreachable, serving from cache");
                Err(SyncError::Offline(msg))
            }
            Err(e) => Err(e),
        }
    }

    /// Drains the outbox inline via the same executor the worker uses,
    /// returning how many rows succeeded/failed (§4.5 "push-before-pull").
    pub fn push_before_pull(&self) -> Result<PushResult> {
        executor::drain(self.store, self.client, std::time::Duration::from_secs(1))
    }

    /// Runs either a full or incremental pull, without any push-before-pull
    /// or freshness check -- used directly by the worker after draining a
    /// batch (§4.4.4) and internally by `ensure_fresh`.
    pub fn pull(&self, full: bool) -> Result<SyncReport> {
        if full { self.full_sync() } else { self.incremental_sync() }
    }

    fn full_sync(&self) -> Result<SyncReport> {
        info!("starting full sync");
        let remote_issues = self.fetch_all_pages(None)?;
        let issues: Vec<Issue> = remote_issues.iter().map(|r| self.translate(r)).collect();

        let pruned = self.store.replace_all_issues(&issues)?;
        self.hydrate_parent_child(&remote_issues)?;

        let now = Utc::now();
        self.store.mark_last_sync(now)?;
        self.store.mark_last_full_sync(now)?;

        info!(pulled = issues.len(), pruned, "full sync complete");
        Ok(SyncReport {
            pulled: issues.len(),
            pruned,
            full: true,
            pushed: PushResult::default(),
        })
    }

    fn incremental_sync(&self) -> Result<SyncReport> {
        let since = self.store.last_sync_at()?;
        debug!(?since, "starting incremental sync");

        let remote_issues = self.fetch_all_pages(since)?;
        let issues: Vec<Issue> = remote_issues.iter().map(|r| self.translate(r)).collect();

        self.store.upsert_issues(&issues)?;
        self.hydrate_parent_child(&remote_issues)?;
        self.store.mark_last_sync(Utc::now())?;

        info!(pulled = issues.len(), "incremental sync complete");
        Ok(SyncReport {
            pulled: issues.len(),
            pruned: 0,
            full: false,
            pushed: PushResult::default(),
        })
    }

    fn fetch_all_pages(&self, since: Option<DateTime<Utc>>) -> Result<Vec<RemoteIssue>> {
        let mut all = Vec::new();
        let mut cursor = None;
        loop {
            let filter = IssueScopeFilter {
                team_id: self.scope.team_id.clone(),
                label_name: self.scope.label_name.clone(),
                project_name: self.scope.project_name.clone(),
                updated_since: since,
                cursor: cursor.clone(),
                page_size: PAGE_SIZE,
            };
            let page = self.client.fetch_issues(&filter)?;
            let len = page.items.len();
            all.extend(page.items);
            debug!(page_len = len, "fetched page");
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(all)
    }

    /// The pull query includes each issue's parent identifier; on receipt,
    /// the store upserts a `parent-child` edge. Other relations are
    /// hydrated on demand by `show --sync` (§4.5).
    fn hydrate_parent_child(&self, remote_issues: &[RemoteIssue]) -> Result<()> {
        for remote in remote_issues {
            self.store.clear_parent_child_edge(&remote.identifier)?;

            if let Some(parent_id) = &remote.parent_id {
                let dep = Dependency::new(remote.identifier.clone(), parent_id.clone(), DependencyType::ParentChild, "");
                self.store.add_dependency(&dep).ok();
            }
        }
        Ok(())
    }

    fn translate(&self, remote: &RemoteIssue) -> Issue {
        Issue {
            id: remote.identifier.clone(),
            title: remote.title.clone(),
            description: remote.description.clone(),
            status: workflow_state_type_to_status(&remote.workflow_state_type),
            priority: remote_priority_to_local(remote.priority),
            issue_type: None::<IssueType>,
            created_at: remote.created_at,
            updated_at: remote.updated_at,
            closed_at: if matches!(workflow_state_type_to_status(&remote.workflow_state_type), Status::Closed) {
                Some(remote.updated_at)
            } else {
                None
            },
            assignee: remote.assignee_email.clone().unwrap_or_default(),
            cached_at: Some(Utc::now()),
            remote_state_id: Some(remote.workflow_state_id.clone()),
        }
    }
}

/// Allocates the next `LOCAL-<n>` identifier in local-only mode (§4.2,
/// §4.5 "local_only: writes apply directly to the cache").
pub fn next_local_identifier(store: &Store) -> Result<String> {
    let n = store.next_local_id()?;
    Ok(format!("LOCAL-{n}"))
}
