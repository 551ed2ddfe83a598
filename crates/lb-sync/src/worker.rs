//! The background worker's drain loop (§4.4.4).
//!
//! ```text
//! acquire PID file
//! repeat:
//!     items := peek_outbox()            # ordered by id ascending
//!     if items empty:
//!         if idle_elapsed: break
//!         sleep 500 ms; continue
//!     for item in items:
//!         try execute(item); ack_outbox(item.id); did_work := true
//!         except transient error as e:
//!             fail_outbox(item.id, e); sleep 1 s
//! if did_work:
//!     run paginated pull (§4.5) and request a JSONL export
//! release PID file
//! ```

use std::path::Path;
use std::time::{Duration, Instant};

use lb_remote::RemoteClient;
use lb_storage::Store;
use tracing::{debug, info, warn};

use crate::engine::{RepoScope, SyncEngine};
use crate::error::Result;
use crate::executor;
use crate::export::request_export;
use crate::pidfile::PidFile;

/// Timing knobs (§4.4.3: poll 500 ms, idle 5 s; §9: failure backoff 1 s).
/// Exposed as a struct, rather than module constants, so tests can run the
/// loop on a compressed timescale.
#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    pub poll_interval: Duration,
    pub idle_timeout: Duration,
    pub failure_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            idle_timeout: Duration::from_secs(5),
            failure_backoff: Duration::from_secs(1),
        }
    }
}

/// Runs the drain loop until idle-timeout elapses with no work and no
/// stay-alive touch, then releases the PID file. Returns immediately
/// without error if another worker already holds the file (lost the
/// election race, §4.4.2).
///
/// After any batch that did real work, runs a paginated pull and requests a
/// JSONL export before looping again (§4.4.4) -- `db_path`/`lb_dir` are
/// needed only for that post-batch export request.
#[allow(clippy::too_many_arguments)]
pub fn run(
    store: &Store,
    client: &RemoteClient,
    scope: RepoScope,
    pid_path: &Path,
    db_path: &Path,
    lb_dir: &Path,
    config: WorkerConfig,
) -> Result<()> {
    let guard = match PidFile::claim(pid_path) {
        Ok(guard) => guard,
        Err(crate::error::SyncError::AlreadyRunning) => {
            info!("worker election lost, another worker already owns the queue");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let mut last_mtime = guard.mtime()?;
    let mut idle_since = Instant::now();
    let engine = SyncEngine::new(store, client, scope);

    loop {
        let batch = store.peek_outbox_batch()?;
        if batch.is_empty() {
            let current_mtime = guard.mtime()?;
            if current_mtime > last_mtime {
                debug!("stay-alive touch observed, resetting idle timer");
                idle_since = Instant::now();
                last_mtime = current_mtime;
            }
            if idle_since.elapsed() >= config.idle_timeout {
                info!("idle timeout elapsed, worker exiting");
                break;
            }
            std::thread::sleep(config.poll_interval);
            continue;
        }

        idle_since = Instant::now();
        let mut did_work = false;
        for entry in &batch {
            match executor::apply(store, client, entry) {
                Ok(()) => {
                    store.ack_outbox(entry.id)?;
                    did_work = true;
                }
                Err(e) => {
                    warn!(id = entry.id, operation = %entry.operation, error = %e, "outbox item failed");
                    store.fail_outbox(entry.id, &e.to_string())?;
                    std::thread::sleep(config.failure_backoff);
                }
            }
        }

        if did_work {
            match engine.pull(engine.needs_full_sync().unwrap_or(false)) {
                Ok(report) => debug!(?report, "post-drain pull complete"),
                Err(e) => warn!(error = %e, "post-drain pull failed"),
            }
            if let Err(e) = request_export(db_path, lb_dir) {
                warn!(error = %e, "failed to request post-drain export");
            }
        }
    }

    drop(guard);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn scope() -> RepoScope {
        RepoScope { team_id: "team-1".to_string(), label_name: None, project_name: None }
    }

    #[test]
    fn losing_the_election_returns_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sync.pid");
        let _holder = PidFile::claim(&path).unwrap();

        let store = Store::open_in_memory().unwrap();
        let client = RemoteClient::new("test-key");
        let config = WorkerConfig {
            poll_interval: Duration::from_millis(1),
            idle_timeout: Duration::from_millis(5),
            failure_backoff: Duration::from_millis(1),
        };
        // Should return Ok(()) immediately without attempting to drain,
        // since `_holder` already owns the file.
        run(&store, &client, scope(), &path, Path::new("db"), dir.path(), config).unwrap();
    }

    #[test]
    fn empty_outbox_exits_after_idle_timeout_and_releases_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sync.pid");
        let store = Store::open_in_memory().unwrap();
        let client = RemoteClient::new("test-key");
        let config = WorkerConfig {
            poll_interval: Duration::from_millis(2),
            idle_timeout: Duration::from_millis(10),
            failure_backoff: Duration::from_millis(1),
        };
        run(&store, &client, scope(), &path, Path::new("db"), dir.path(), config).unwrap();
        assert!(!path.exists());
    }
}
